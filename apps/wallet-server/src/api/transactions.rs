// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transfer submission and ledger lookup.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    error::{ApiError, ErrorBody},
    models::WalletAddress,
    state::AppState,
    storage::Transaction,
    transfer::TransferRequest,
};

/// Signed transfer request.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateTransactionRequest {
    /// Sender address
    pub from: String,
    /// Recipient address
    pub to: String,
    /// Amount in ETH, as a string or number (e.g. "1.5")
    #[schema(value_type = String)]
    pub amount: Decimal,
    /// `personal_sign` signature over the message from
    /// `GET /v1/wallets/{from}/transfer-message`
    pub signature: String,
}

/// Submit a signed transfer.
#[utoipa::path(
    post,
    path = "/v1/transactions",
    tag = "Transactions",
    request_body = CreateTransactionRequest,
    responses(
        (status = 201, description = "Transfer completed", body = Transaction),
        (status = 400, description = "Invalid amount, invalid signature or insufficient funds", body = ErrorBody),
        (status = 404, description = "Sender or recipient not found", body = ErrorBody)
    )
)]
pub async fn create_transaction(
    State(state): State<AppState>,
    Json(request): Json<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<Transaction>), ApiError> {
    let request = TransferRequest {
        from: request.from.parse::<WalletAddress>()?,
        to: request.to.parse::<WalletAddress>()?,
        amount: request.amount,
        signature: request.signature,
    };

    let tx = state.engine.transfer(&request).await?;
    Ok((StatusCode::CREATED, Json(tx)))
}

/// Get a ledger record by id or tx hash.
#[utoipa::path(
    get,
    path = "/v1/transactions/{id}",
    tag = "Transactions",
    params(
        ("id" = String, Path, description = "Transaction id or 0x-prefixed tx hash")
    ),
    responses(
        (status = 200, description = "Transaction", body = Transaction),
        (status = 404, description = "Transaction not found", body = ErrorBody)
    )
)]
pub async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Transaction>, ApiError> {
    state
        .store
        .get_transaction(&id)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Transaction {id} not found")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{crypto::transfer_message, state::test_support::test_state, storage::TxStatus};
    use alloy::signers::{local::PrivateKeySigner, SignerSync};

    fn register(state: &AppState, signer: &PrivateKeySigner) -> WalletAddress {
        let address: WalletAddress = signer.address().into();
        state
            .store
            .create_wallet(address.clone(), None, Decimal::ONE_HUNDRED)
            .unwrap();
        address
    }

    fn signed_body(
        signer: &PrivateKeySigner,
        to: &WalletAddress,
        amount: &str,
        nonce: u64,
    ) -> CreateTransactionRequest {
        let from: WalletAddress = signer.address().into();
        let amount: Decimal = amount.parse().unwrap();
        let message = transfer_message(&from, to, amount, nonce);
        let signature = signer.sign_message_sync(message.as_bytes()).unwrap();
        CreateTransactionRequest {
            from: from.to_string(),
            to: to.to_string(),
            amount,
            signature: alloy::hex::encode_prefixed(signature.as_bytes()),
        }
    }

    #[tokio::test]
    async fn signed_transfer_is_created_and_retrievable() {
        let t = test_state(Some(2000));
        let alice = PrivateKeySigner::random();
        let from = register(&t.state, &alice);
        let to = register(&t.state, &PrivateKeySigner::random());

        let (status, Json(tx)) = create_transaction(
            State(t.state.clone()),
            Json(signed_body(&alice, &to, "10", 0)),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(tx.from_address, from);
        assert_eq!(tx.status, TxStatus::Completed);

        let Json(by_id) = get_transaction(State(t.state.clone()), Path(tx.id.clone()))
            .await
            .unwrap();
        assert_eq!(by_id, tx);
        let Json(by_hash) = get_transaction(State(t.state.clone()), Path(tx.tx_hash.clone()))
            .await
            .unwrap();
        assert_eq!(by_hash.id, tx.id);
    }

    #[tokio::test]
    async fn errors_map_to_status_codes() {
        let t = test_state(None);
        let alice = PrivateKeySigner::random();
        register(&t.state, &alice);
        let bob = register(&t.state, &PrivateKeySigner::random());
        let ghost: WalletAddress = PrivateKeySigner::random().address().into();

        let err = create_transaction(State(t.state.clone()), Json(signed_body(&alice, &ghost, "1", 0)))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let err = create_transaction(State(t.state.clone()), Json(signed_body(&alice, &bob, "1", 7)))
            .await
            .unwrap_err();
        assert_eq!((err.status, err.code), (StatusCode::BAD_REQUEST, "invalid_signature"));

        let err = create_transaction(State(t.state.clone()), Json(signed_body(&alice, &bob, "101", 0)))
            .await
            .unwrap_err();
        assert_eq!((err.status, err.code), (StatusCode::BAD_REQUEST, "insufficient_funds"));

        let mut bad_from = signed_body(&alice, &bob, "1", 0);
        bad_from.from = "alice".into();
        let err = create_transaction(State(t.state.clone()), Json(bad_from))
            .await
            .unwrap_err();
        assert_eq!((err.status, err.code), (StatusCode::BAD_REQUEST, "bad_request"));
    }

    #[tokio::test]
    async fn missing_transaction_is_404() {
        let t = test_state(None);
        let err = get_transaction(State(t.state.clone()), Path("nope".into()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
