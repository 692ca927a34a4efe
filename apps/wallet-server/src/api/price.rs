// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! ETH price and ETH/USD conversion endpoints.

use axum::{extract::State, Json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::{ApiError, ErrorBody},
    oracle::{PriceQuote, PriceSource},
    state::AppState,
};

/// Convert either a USD amount or an ETH amount. `eth` wins if both are set.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ConvertRequest {
    #[schema(value_type = Option<String>)]
    pub usd: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub eth: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ConvertResponse {
    pub eth: Decimal,
    pub usd: Decimal,
    pub eth_usd: Decimal,
    pub source: PriceSource,
    pub stale: bool,
}

const NO_PRICE: &str = "ETH price is unavailable";

/// Current ETH→USD rate.
#[utoipa::path(
    get,
    path = "/v1/price",
    tag = "Price",
    responses(
        (status = 200, description = "Current rate (possibly stale)", body = PriceQuote),
        (status = 503, description = "No usable rate", body = ErrorBody)
    )
)]
pub async fn get_price(State(state): State<AppState>) -> Result<Json<PriceQuote>, ApiError> {
    let quote = state.oracle.eth_usd_rate().await;
    if !quote.is_available() {
        return Err(ApiError::degraded(NO_PRICE));
    }
    Ok(Json(quote))
}

/// Convert between ETH and USD at the current rate.
#[utoipa::path(
    post,
    path = "/v1/convert",
    tag = "Price",
    request_body = ConvertRequest,
    responses(
        (status = 200, description = "Converted amounts", body = ConvertResponse),
        (status = 400, description = "Neither amount given, or amount out of range", body = ErrorBody),
        (status = 503, description = "No usable rate", body = ErrorBody)
    )
)]
pub async fn convert(
    State(state): State<AppState>,
    Json(request): Json<ConvertRequest>,
) -> Result<Json<ConvertResponse>, ApiError> {
    if request.eth.is_none() && request.usd.is_none() {
        return Err(ApiError::bad_request("either `usd` or `eth` is required"));
    }

    let quote = state.oracle.eth_usd_rate().await;
    if !quote.is_available() {
        return Err(ApiError::degraded(NO_PRICE));
    }

    let converted = match (request.eth, request.usd) {
        (Some(eth), _) => quote.eth_to_usd(eth).map(|usd| (eth, usd)),
        (None, Some(usd)) => quote.usd_to_eth(usd).map(|eth| (eth, usd)),
        (None, None) => None,
    };
    let (eth, usd) =
        converted.ok_or_else(|| ApiError::bad_request("amount is out of range"))?;

    Ok(Json(ConvertResponse {
        eth,
        usd,
        eth_usd: quote.eth_usd,
        source: quote.source,
        stale: quote.stale,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::test_state;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn price_from_cache() {
        let t = test_state(Some(2500));
        let Json(quote) = get_price(State(t.state.clone())).await.unwrap();
        assert_eq!(quote.eth_usd, Decimal::from(2500));
        assert_eq!(quote.source, PriceSource::Cached);
    }

    #[tokio::test]
    async fn price_unavailable_is_503() {
        let t = test_state(None);
        let err = get_price(State(t.state.clone())).await.unwrap_err();
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.code, "external_service_degraded");
    }

    #[tokio::test]
    async fn convert_both_directions() {
        let t = test_state(Some(2000));

        let Json(from_eth) = convert(
            State(t.state.clone()),
            Json(ConvertRequest {
                eth: Some("1.5".parse().unwrap()),
                usd: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(from_eth.usd, Decimal::from(3000));

        let Json(from_usd) = convert(
            State(t.state.clone()),
            Json(ConvertRequest {
                eth: None,
                usd: Some(Decimal::from(500)),
            }),
        )
        .await
        .unwrap();
        assert_eq!(from_usd.eth, "0.25".parse::<Decimal>().unwrap());
    }

    #[tokio::test]
    async fn convert_requires_an_amount_and_a_rate() {
        let t = test_state(None);
        let err = convert(State(t.state.clone()), Json(ConvertRequest::default()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err = convert(
            State(t.state.clone()),
            Json(ConvertRequest {
                eth: Some(Decimal::ONE),
                usd: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn convert_largest_amounts_is_bad_request() {
        let t = test_state(Some(2000));

        for request in [
            ConvertRequest {
                eth: Some("70000000000000000000000000000".parse().unwrap()),
                usd: None,
            },
            ConvertRequest {
                eth: Some(Decimal::MAX),
                usd: None,
            },
        ] {
            let err = convert(State(t.state.clone()), Json(request))
                .await
                .unwrap_err();
            assert_eq!(err.status, StatusCode::BAD_REQUEST);
            assert_eq!(err.code, "bad_request");
        }
    }
}
