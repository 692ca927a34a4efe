// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Transfer Engine
//!
//! Validates and applies a single signed ETH transfer between two wallets.
//!
//! ## Steps
//!
//! 1. Reject non-positive amounts and self-transfers.
//! 2. Obtain a best-effort USD quote (before any lock is taken).
//! 3. In ONE ledger write transaction:
//!    - load both wallets (`NotFound` if either is missing),
//!    - rebuild the canonical message with the sender's nonce and verify the
//!      signature (`InvalidSignature`, nothing written),
//!    - check the balance (`InsufficientFunds`, a `rejected` record is
//!      appended and balances stay untouched),
//!    - debit, credit, bump the sender nonce and append a `completed` record.
//! 4. After commit, enqueue email notifications.

use std::sync::Arc;

use alloy::primitives::keccak256;
use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::{
    crypto::{transfer_message, verify_signature},
    models::WalletAddress,
    notify::{Notification, NotificationQueue},
    oracle::{PriceOracle, PriceQuote},
    storage::{LedgerStore, LedgerWrite, StoreError, Transaction, TxStatus},
};

/// Maximum number of fractional digits accepted for an amount (wei).
pub const MAX_AMOUNT_SCALE: u32 = 18;

#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("wallet {0} not found")]
    NotFound(WalletAddress),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("signature does not match sender {0}")]
    InvalidSignature(WalletAddress),

    #[error("insufficient funds: balance {balance} ETH, requested {requested} ETH")]
    InsufficientFunds { balance: Decimal, requested: Decimal },

    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// A transfer as submitted by a client.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub from: WalletAddress,
    pub to: WalletAddress,
    pub amount: Decimal,
    /// 65-byte `personal_sign` signature over [`transfer_message`], hex encoded
    pub signature: String,
}

enum Outcome {
    Completed {
        tx: Transaction,
        sender_email: Option<String>,
        recipient_email: Option<String>,
    },
    Rejected {
        balance: Decimal,
    },
}

pub struct TransferEngine {
    store: Arc<LedgerStore>,
    oracle: Arc<PriceOracle>,
    notifications: NotificationQueue,
}

impl TransferEngine {
    pub fn new(
        store: Arc<LedgerStore>,
        oracle: Arc<PriceOracle>,
        notifications: NotificationQueue,
    ) -> Self {
        Self {
            store,
            oracle,
            notifications,
        }
    }

    /// Validate and apply a transfer, returning the completed ledger record.
    pub async fn transfer(&self, request: &TransferRequest) -> Result<Transaction, TransferError> {
        validate_amount(request)?;

        let quote = self.oracle.eth_usd_rate().await;

        let outcome = self
            .store
            .write(|w| -> Result<Outcome, TransferError> { apply(w, request, &quote) })?;

        match outcome {
            Outcome::Completed {
                tx,
                sender_email,
                recipient_email,
            } => {
                info!(
                    tx_id = %tx.id,
                    from = %tx.from_address,
                    to = %tx.to_address,
                    amount = %tx.amount,
                    price_degraded = tx.price_degraded,
                    "Transfer completed"
                );
                if let Some(email) = sender_email {
                    self.notifications.enqueue(Notification::sent(&email, &tx));
                }
                if let Some(email) = recipient_email {
                    self.notifications.enqueue(Notification::received(&email, &tx));
                }
                Ok(tx)
            }
            Outcome::Rejected { balance } => {
                warn!(
                    from = %request.from,
                    balance = %balance,
                    requested = %request.amount,
                    "Transfer rejected: insufficient funds"
                );
                Err(TransferError::InsufficientFunds {
                    balance,
                    requested: request.amount,
                })
            }
        }
    }
}

fn validate_amount(request: &TransferRequest) -> Result<(), TransferError> {
    if request.amount <= Decimal::ZERO {
        return Err(TransferError::InvalidAmount(
            "amount must be positive".to_string(),
        ));
    }
    if request.amount.normalize().scale() > MAX_AMOUNT_SCALE {
        return Err(TransferError::InvalidAmount(format!(
            "amount has more than {MAX_AMOUNT_SCALE} decimal places"
        )));
    }
    if request.from == request.to {
        return Err(TransferError::InvalidAmount(
            "sender and recipient must differ".to_string(),
        ));
    }
    Ok(())
}

/// Body of the write transaction. Returning `Err` aborts every write.
fn apply(
    w: &mut LedgerWrite<'_>,
    request: &TransferRequest,
    quote: &PriceQuote,
) -> Result<Outcome, TransferError> {
    let mut from = w
        .find_wallet(&request.from)?
        .ok_or_else(|| TransferError::NotFound(request.from.clone()))?;
    let mut to = w
        .find_wallet(&request.to)?
        .ok_or_else(|| TransferError::NotFound(request.to.clone()))?;

    let message = transfer_message(&from.address, &to.address, request.amount, from.nonce);
    if !verify_signature(&message, &request.signature, &from.address) {
        return Err(TransferError::InvalidSignature(from.address));
    }

    if from.balance < request.amount {
        let mut tx = ledger_record(request, &message, from.nonce, quote);
        tx.status = TxStatus::Rejected;
        tx.reason = Some("insufficient funds".to_string());
        w.append_transaction(&mut tx)?;
        return Ok(Outcome::Rejected {
            balance: from.balance,
        });
    }

    // from.balance >= amount >= 0, so only the credit can overflow
    let debited = from.balance - request.amount;
    let credited = to.balance.checked_add(request.amount).ok_or_else(|| {
        TransferError::InvalidAmount("recipient balance would overflow".to_string())
    })?;

    let mut tx = ledger_record(request, &message, from.nonce, quote);
    from.nonce += 1;
    w.update_balance(&mut from, debited)?;
    w.update_balance(&mut to, credited)?;
    w.append_transaction(&mut tx)?;

    Ok(Outcome::Completed {
        tx,
        sender_email: from.email,
        recipient_email: to.email,
    })
}

/// Completed ledger record for `request`; the sequence number is assigned
/// on append.
fn ledger_record(
    request: &TransferRequest,
    message: &str,
    nonce: u64,
    quote: &PriceQuote,
) -> Transaction {
    let id = uuid::Uuid::new_v4().to_string();
    Transaction {
        tx_hash: alloy::hex::encode_prefixed(keccak256(format!("{id}:{message}"))),
        id,
        seq: 0,
        from_address: request.from.clone(),
        to_address: request.to.clone(),
        amount: request.amount,
        nonce,
        eth_usd_rate: quote.eth_usd,
        // Out-of-range values are recorded as 0, like a missing price
        usd_value_at_time: quote.eth_to_usd(request.amount).unwrap_or(Decimal::ZERO),
        price_degraded: quote.stale,
        status: TxStatus::Completed,
        reason: None,
        timestamp: Utc::now(),
    }
}
