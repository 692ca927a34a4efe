// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    error::ErrorBody,
    models::WalletAddress,
    oracle::{PriceQuote, PriceSource},
    state::AppState,
    storage::{Direction, Transaction, TxStatus, WalletResponse},
};

pub mod health;
pub mod price;
pub mod transactions;
pub mod wallets;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route(
            "/wallets",
            get(wallets::list_wallets).post(wallets::create_wallet),
        )
        .route("/wallets/{address}", get(wallets::get_wallet))
        .route(
            "/wallets/{address}/transfer-message",
            get(wallets::transfer_message_for),
        )
        .route(
            "/wallets/{address}/transactions",
            get(wallets::list_wallet_transactions),
        )
        .route("/transactions", post(transactions::create_transaction))
        .route("/transactions/{id}", get(transactions::get_transaction))
        .route("/price", get(price::get_price))
        .route("/convert", post(price::convert));

    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .nest("/v1", v1_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        wallets::create_wallet,
        wallets::list_wallets,
        wallets::get_wallet,
        wallets::transfer_message_for,
        wallets::list_wallet_transactions,
        transactions::create_transaction,
        transactions::get_transaction,
        price::get_price,
        price::convert,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            WalletAddress,
            WalletResponse,
            Transaction,
            TxStatus,
            Direction,
            PriceQuote,
            PriceSource,
            ErrorBody,
            wallets::CreateWalletRequest,
            wallets::CreateWalletResponse,
            wallets::WalletListResponse,
            wallets::WalletDetailResponse,
            wallets::TransferMessageResponse,
            wallets::HistoryEntry,
            wallets::HistoryResponse,
            transactions::CreateTransactionRequest,
            price::ConvertRequest,
            price::ConvertResponse,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Wallets", description = "Wallet creation, balances and history"),
        (name = "Transactions", description = "Signed transfers and ledger lookup"),
        (name = "Price", description = "ETH→USD rate and conversion"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{crypto::transfer_message, state::test_support::test_state};
    use alloy::signers::{local::PrivateKeySigner, SignerSync};
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(json) => Body::from(json.to_string()),
                None => Body::empty(),
            })
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn sign(signer: &PrivateKeySigner, to: &WalletAddress, amount: &str, nonce: u64) -> String {
        let from: WalletAddress = signer.address().into();
        let message = transfer_message(&from, to, amount.parse().unwrap(), nonce);
        let sig = signer.sign_message_sync(message.as_bytes()).unwrap();
        alloy::hex::encode_prefixed(sig.as_bytes())
    }

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let t = test_state(None);
        let _ = router(t.state.clone()).into_make_service();
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        let t = test_state(None);
        let app = router(t.state.clone());
        let response = app
            .oneshot(Request::get("/health/live").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let t = test_state(None);
        let app = router(t.state.clone());
        let (status, doc) = call(&app, "GET", "/api-doc/openapi.json", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(doc["paths"]["/v1/transactions"].is_object());
    }

    #[tokio::test]
    async fn end_to_end_transfer_scenario() {
        let t = test_state(Some(2000));
        let app = router(t.state.clone());

        let alice = PrivateKeySigner::random();
        let bob = PrivateKeySigner::random();
        let a: WalletAddress = alice.address().into();
        let b: WalletAddress = bob.address().into();

        for addr in [&a, &b] {
            let (status, body) =
                call(&app, "POST", "/v1/wallets", Some(json!({ "address": addr }))).await;
            assert_eq!(status, StatusCode::CREATED);
            assert_eq!(body["wallet"]["balance"], "100");
        }

        // Message endpoint matches what the client signs locally
        let (_, msg) = call(
            &app,
            "GET",
            &format!("/v1/wallets/{a}/transfer-message?to={b}&amount=10"),
            None,
        )
        .await;
        let expected = transfer_message(&a, &b, "10".parse().unwrap(), 0);
        assert_eq!(msg["message"], expected.as_str());

        let (status, tx) = call(
            &app,
            "POST",
            "/v1/transactions",
            Some(json!({
                "from": a, "to": b, "amount": "10", "signature": sign(&alice, &b, "10", 0)
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(tx["amount"], "10");
        assert_eq!(tx["status"], "completed");

        let (_, wallet_a) = call(&app, "GET", &format!("/v1/wallets/{a}"), None).await;
        assert_eq!(wallet_a["balance"], "90");
        assert_eq!(wallet_a["balance_usd"], "180000");
        let (_, wallet_b) = call(&app, "GET", &format!("/v1/wallets/{b}"), None).await;
        assert_eq!(wallet_b["balance"], "110");

        // Signed by Bob while claiming Alice as sender
        let (status, err) = call(
            &app,
            "POST",
            "/v1/transactions",
            Some(json!({
                "from": a, "to": b, "amount": "10", "signature": sign(&bob, &b, "10", 1)
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["code"], "invalid_signature");

        let (_, wallet_a) = call(&app, "GET", &format!("/v1/wallets/{a}"), None).await;
        assert_eq!(wallet_a["balance"], "90");
        let (_, wallet_b) = call(&app, "GET", &format!("/v1/wallets/{b}"), None).await;
        assert_eq!(wallet_b["balance"], "110");

        let (_, history) = call(&app, "GET", &format!("/v1/wallets/{a}/transactions"), None).await;
        let entries = history["transactions"].as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["direction"], "sent");
        assert_eq!(entries[0]["id"], tx["id"]);

        let (_, history_b) = call(&app, "GET", &format!("/v1/wallets/{b}/transactions"), None).await;
        assert_eq!(history_b["transactions"][0]["direction"], "received");
    }

    #[tokio::test]
    async fn history_paginates_newest_first() {
        let t = test_state(Some(2000));
        let app = router(t.state.clone());
        let alice = PrivateKeySigner::random();
        let a: WalletAddress = alice.address().into();
        let b: WalletAddress = PrivateKeySigner::random().address().into();
        t.state.store.create_wallet(a.clone(), None, rust_decimal::Decimal::ONE_HUNDRED).unwrap();
        t.state.store.create_wallet(b.clone(), None, rust_decimal::Decimal::ZERO).unwrap();

        for (nonce, amount) in ["1", "2", "3"].iter().enumerate() {
            let (status, _) = call(
                &app,
                "POST",
                "/v1/transactions",
                Some(json!({
                    "from": a, "to": b, "amount": amount,
                    "signature": sign(&alice, &b, amount, nonce as u64)
                })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (_, page1) =
            call(&app, "GET", &format!("/v1/wallets/{a}/transactions?limit=2"), None).await;
        assert_eq!(page1["transactions"][0]["amount"], "3");
        assert_eq!(page1["transactions"][1]["amount"], "2");
        let cursor = page1["next_cursor"].as_str().unwrap().to_string();

        let (_, page2) = call(
            &app,
            "GET",
            &format!("/v1/wallets/{a}/transactions?limit=2&cursor={cursor}"),
            None,
        )
        .await;
        assert_eq!(page2["transactions"].as_array().unwrap().len(), 1);
        assert_eq!(page2["transactions"][0]["amount"], "1");
        assert!(page2.get("next_cursor").is_none());
    }

    #[tokio::test]
    async fn unknown_routes_and_wallets() {
        let t = test_state(None);
        let app = router(t.state.clone());

        let (status, err) = call(
            &app,
            "GET",
            "/v1/wallets/0x0000000000000000000000000000000000000001",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(err["code"], "not_found");

        let (status, err) = call(&app, "GET", "/v1/wallets/not-an-address", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["code"], "bad_request");
    }
}
