// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet management endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    crypto::{generate_keypair, transfer_message},
    error::{ApiError, ErrorBody},
    models::WalletAddress,
    notify::Notification,
    oracle::PriceSource,
    state::AppState,
    storage::{Direction, Transaction, WalletResponse},
};

/// Default page size for transaction history.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;
/// Largest page size a client may request.
pub const MAX_HISTORY_LIMIT: usize = 100;

// =============================================================================
// Request/Response Types
// =============================================================================

/// Request to create a wallet.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CreateWalletRequest {
    /// Address to register. When omitted the server generates a key pair.
    #[serde(default)]
    pub address: Option<String>,
    /// Email for welcome and transfer notifications
    #[serde(default)]
    pub email: Option<String>,
}

/// Wallet creation response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CreateWalletResponse {
    pub wallet: WalletResponse,
    /// Generated private key. Only present when the server generated the
    /// address, and never returned again.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
}

/// List of wallets.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WalletListResponse {
    pub wallets: Vec<WalletResponse>,
}

/// Wallet with its balance valued in USD.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WalletDetailResponse {
    pub address: WalletAddress,
    /// Balance in ETH
    pub balance: Decimal,
    /// Balance in USD (absent when no price is available)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance_usd: Option<Decimal>,
    /// ETH→USD rate used for `balance_usd`
    pub eth_usd: Decimal,
    pub price_source: PriceSource,
    /// Whether the price is stale or missing
    pub price_stale: bool,
    /// Nonce the next transfer message must carry
    pub nonce: u64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Query for the text a sender must sign.
#[derive(Debug, Deserialize, IntoParams)]
pub struct TransferMessageQuery {
    /// Recipient address
    pub to: String,
    /// Amount in ETH
    #[param(value_type = String)]
    pub amount: Decimal,
}

/// Text to sign with `personal_sign` to authorize a transfer.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TransferMessageResponse {
    pub message: String,
    pub nonce: u64,
}

/// Query parameters for transaction history.
#[derive(Debug, Deserialize, IntoParams)]
pub struct HistoryQuery {
    /// Maximum number of results (default: 50, max: 100)
    #[param(default = 50)]
    pub limit: Option<usize>,
    /// Cursor returned by the previous page
    pub cursor: Option<String>,
}

/// Transaction as seen from one wallet.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub transaction: Transaction,
    /// "sent" or "received" relative to the queried wallet
    pub direction: Direction,
}

/// A page of transaction history, newest first.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HistoryResponse {
    pub transactions: Vec<HistoryEntry>,
    /// Pass as `cursor` to fetch the next page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Create a wallet credited with the initial balance.
#[utoipa::path(
    post,
    path = "/v1/wallets",
    tag = "Wallets",
    request_body = CreateWalletRequest,
    responses(
        (status = 201, description = "Wallet created successfully", body = CreateWalletResponse),
        (status = 400, description = "Invalid address or email", body = ErrorBody),
        (status = 409, description = "Wallet already exists", body = ErrorBody)
    )
)]
pub async fn create_wallet(
    State(state): State<AppState>,
    Json(request): Json<CreateWalletRequest>,
) -> Result<(StatusCode, Json<CreateWalletResponse>), ApiError> {
    let email = match request.email.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => {
            raw.parse::<lettre::Address>()
                .map_err(|_| ApiError::bad_request(format!("invalid email `{raw}`")))?;
            Some(raw.to_string())
        }
    };

    let (address, private_key) = match request.address.as_deref() {
        Some(raw) => (raw.parse::<WalletAddress>()?, None),
        None => {
            let key = generate_keypair();
            (key.address, Some(key.private_key))
        }
    };

    let wallet = state
        .store
        .create_wallet(address, email, state.initial_balance)?;

    tracing::info!(
        address = %wallet.address,
        generated = private_key.is_some(),
        balance = %wallet.balance,
        "Wallet created"
    );

    if let Some(email) = &wallet.email {
        state.notifications.enqueue(Notification::welcome(
            email,
            &wallet.address,
            wallet.balance,
        ));
    }

    Ok((
        StatusCode::CREATED,
        Json(CreateWalletResponse {
            wallet: wallet.into(),
            private_key,
        }),
    ))
}

/// List every wallet, ordered by address.
#[utoipa::path(
    get,
    path = "/v1/wallets",
    tag = "Wallets",
    responses(
        (status = 200, description = "List of wallets", body = WalletListResponse)
    )
)]
pub async fn list_wallets(
    State(state): State<AppState>,
) -> Result<Json<WalletListResponse>, ApiError> {
    let wallets = state
        .store
        .list_wallets()?
        .into_iter()
        .map(WalletResponse::from)
        .collect();
    Ok(Json(WalletListResponse { wallets }))
}

/// Get a wallet with its USD valuation.
///
/// A missing price never fails the request; `balance_usd` is omitted and
/// `price_stale` is set instead.
#[utoipa::path(
    get,
    path = "/v1/wallets/{address}",
    tag = "Wallets",
    params(
        ("address" = String, Path, description = "Wallet address")
    ),
    responses(
        (status = 200, description = "Wallet details", body = WalletDetailResponse),
        (status = 400, description = "Invalid address", body = ErrorBody),
        (status = 404, description = "Wallet not found", body = ErrorBody)
    )
)]
pub async fn get_wallet(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<WalletDetailResponse>, ApiError> {
    let address: WalletAddress = address.parse()?;
    let wallet = state.store.get_wallet(&address)?;
    let quote = state.oracle.eth_usd_rate().await;

    Ok(Json(WalletDetailResponse {
        balance_usd: quote.eth_to_usd(wallet.balance),
        eth_usd: quote.eth_usd,
        price_source: quote.source,
        price_stale: quote.stale,
        address: wallet.address,
        balance: wallet.balance,
        nonce: wallet.nonce,
        created_at: wallet.created_at,
    }))
}

/// Canonical message the sender must sign for a transfer.
#[utoipa::path(
    get,
    path = "/v1/wallets/{address}/transfer-message",
    tag = "Wallets",
    params(
        ("address" = String, Path, description = "Sender address"),
        TransferMessageQuery
    ),
    responses(
        (status = 200, description = "Message to sign", body = TransferMessageResponse),
        (status = 400, description = "Invalid address", body = ErrorBody),
        (status = 404, description = "Sender not found", body = ErrorBody)
    )
)]
pub async fn transfer_message_for(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Query(query): Query<TransferMessageQuery>,
) -> Result<Json<TransferMessageResponse>, ApiError> {
    let from: WalletAddress = address.parse()?;
    let to: WalletAddress = query.to.parse()?;
    let wallet = state.store.get_wallet(&from)?;

    Ok(Json(TransferMessageResponse {
        message: transfer_message(&from, &to, query.amount, wallet.nonce),
        nonce: wallet.nonce,
    }))
}

/// Paginated transaction history for a wallet, newest first.
#[utoipa::path(
    get,
    path = "/v1/wallets/{address}/transactions",
    tag = "Wallets",
    params(
        ("address" = String, Path, description = "Wallet address"),
        HistoryQuery
    ),
    responses(
        (status = 200, description = "Transaction history", body = HistoryResponse),
        (status = 400, description = "Invalid address", body = ErrorBody),
        (status = 404, description = "Wallet not found", body = ErrorBody)
    )
)]
pub async fn list_wallet_transactions(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let address: WalletAddress = address.parse()?;
    // 404 for unknown wallets rather than an empty page
    state.store.get_wallet(&address)?;

    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);
    let (page, next_cursor) =
        state
            .store
            .list_by_wallet(&address, query.cursor.as_deref(), limit)?;

    Ok(Json(HistoryResponse {
        transactions: page
            .into_iter()
            .map(|(transaction, direction)| HistoryEntry {
                transaction,
                direction,
            })
            .collect(),
        next_cursor,
    }))
}
