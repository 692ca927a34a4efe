// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::time::Instant;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Health check response with individual component status.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// Overall health status ("ok", "degraded" or "unavailable").
    pub status: String,
    /// Individual health checks and their results.
    pub checks: HealthChecks,
}

/// Individual health check results.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthChecks {
    /// Whether the service process is running.
    pub service: String,
    /// Ledger database readability.
    pub store: String,
    /// Price oracle: "ok", "stale" or "unavailable".
    pub price: String,
    /// Whether email notifications are configured.
    pub notifications: String,
}

/// Simple health check response for liveness probes.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

fn check_store(state: &AppState) -> String {
    match state.store.ping() {
        Ok(()) => "ok".to_string(),
        Err(e) => {
            tracing::error!(error = %e, "Ledger store health check failed");
            "unavailable".to_string()
        }
    }
}

/// Reads the price cache only, never the upstream API.
fn check_price(state: &AppState) -> String {
    let cache = state.oracle.cache();
    let now = Instant::now();
    if cache.fresh(now).is_some() {
        "ok"
    } else if cache.usable(now).is_some() {
        "stale"
    } else {
        "unavailable"
    }
    .to_string()
}

/// Health check endpoint handler.
///
/// Returns 503 only when the ledger store is unreadable. A degraded price
/// oracle is reported as `degraded` with 200.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy or degraded", body = ReadyResponse),
        (status = 503, description = "Service is unhealthy", body = ReadyResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let store = check_store(&state);
    let price = check_price(&state);

    let store_ok = store == "ok";
    let status = if !store_ok {
        "unavailable"
    } else if price != "ok" {
        "degraded"
    } else {
        "ok"
    };

    let response = ReadyResponse {
        status: status.to_string(),
        checks: HealthChecks {
            service: "ok".to_string(),
            store,
            price,
            notifications: if state.notifications.is_enabled() {
                "enabled"
            } else {
                "disabled"
            }
            .to_string(),
        },
    };

    let code = if store_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(response))
}

/// Liveness probe handler.
///
/// Always returns 200 if the process is running.
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Readiness probe handler.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Service is ready", body = ReadyResponse),
        (status = 503, description = "Service is not ready", body = ReadyResponse)
    )
)]
pub async fn readiness(state: State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    health(state).await
}
