// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Append-only transaction ledger.
//!
//! Records are written once by the transfer engine and never updated. Each
//! record gets a ledger-wide sequence number; the per-wallet index stores the
//! inverted sequence so a forward range scan yields newest first.

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::database::{
    LedgerStore, LedgerWrite, StoreError, StoreResult, TRANSACTIONS, TX_HASH_INDEX,
    WALLET_TX_INDEX,
};
use crate::models::WalletAddress;

/// Terminal state of a transfer attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    /// Balances were moved
    Completed,
    /// Authenticated attempt refused; balances untouched
    Rejected,
}

/// Which side of a transaction a wallet is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Sent,
    Received,
}

impl Direction {
    fn as_str(self) -> &'static str {
        match self {
            Direction::Sent => "sent",
            Direction::Received => "received",
        }
    }

    fn parse(raw: &str) -> StoreResult<Self> {
        match raw {
            "sent" => Ok(Direction::Sent),
            "received" => Ok(Direction::Received),
            other => Err(StoreError::Corrupt(format!("unknown direction `{other}`"))),
        }
    }
}

/// Ledger record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Transaction {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// Mock transaction hash (0x-prefixed keccak256)
    pub tx_hash: String,
    /// Ledger-wide sequence number, assigned on append
    pub seq: u64,
    /// Sender address
    pub from_address: WalletAddress,
    /// Recipient address
    pub to_address: WalletAddress,
    /// Amount in ETH
    pub amount: Decimal,
    /// Sender nonce carried by the signed message
    pub nonce: u64,
    /// ETH→USD rate used for `usd_value_at_time`
    pub eth_usd_rate: Decimal,
    /// `amount * eth_usd_rate`
    pub usd_value_at_time: Decimal,
    /// Whether the rate came from a stale cache or the fallback
    pub price_degraded: bool,
    /// Completed or rejected
    pub status: TxStatus,
    /// Why the attempt was rejected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// When the record was written
    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// Index Key Helpers
// =============================================================================

/// Build a composite key for the wallet_tx_index table.
///
/// Format: `address | inverted_seq_be_bytes | id`
fn make_index_key(address: &WalletAddress, seq: u64, id: &str) -> Vec<u8> {
    let addr = address.as_str();
    let mut key = Vec::with_capacity(addr.len() + 1 + 8 + 1 + id.len());
    key.extend_from_slice(addr.as_bytes());
    key.push(b'|');
    key.extend_from_slice(&(!seq).to_be_bytes());
    key.push(b'|');
    key.extend_from_slice(id.as_bytes());
    key
}

fn make_prefix(address: &WalletAddress) -> Vec<u8> {
    let mut prefix = address.as_str().as_bytes().to_vec();
    prefix.push(b'|');
    prefix
}

/// Upper bound for a range scan: past any key with this prefix.
fn make_prefix_end(address: &WalletAddress) -> Vec<u8> {
    let mut end = address.as_str().as_bytes().to_vec();
    end.push(b'|' + 1);
    end
}

/// Extract the id portion from a composite index key.
fn extract_id_from_key(key: &[u8], prefix_len: usize) -> Option<String> {
    // prefix, 8 bytes of inverted seq, '|', id
    let start = prefix_len + 8 + 1;
    key.get(start..)
        .and_then(|id| String::from_utf8(id.to_vec()).ok())
}

fn encode_cursor(key: &[u8]) -> String {
    alloy::hex::encode(key)
}

fn decode_cursor(cursor: &str) -> Option<Vec<u8>> {
    alloy::hex::decode(cursor).ok()
}

// =============================================================================
// Operations
// =============================================================================

impl LedgerWrite<'_> {
    /// Append a record, assigning its sequence number, and index it under
    /// both parties.
    pub fn append_transaction(&mut self, tx: &mut Transaction) -> StoreResult<()> {
        tx.seq = self.next_seq()?;
        let json = serde_json::to_vec(tx)?;

        self.transactions.insert(tx.id.as_str(), json.as_slice())?;
        self.tx_hash_index.insert(tx.tx_hash.as_str(), tx.id.as_str())?;

        for (addr, direction) in [
            (&tx.from_address, Direction::Sent),
            (&tx.to_address, Direction::Received),
        ] {
            let key = make_index_key(addr, tx.seq, &tx.id);
            self.wallet_tx_index.insert(key.as_slice(), direction.as_str())?;
        }
        Ok(())
    }
}

impl LedgerStore {
    /// Look up a record by id or by tx_hash.
    pub fn get_transaction(&self, id_or_hash: &str) -> StoreResult<Option<Transaction>> {
        let read_txn = self.db.begin_read()?;
        let tx_table = read_txn.open_table(TRANSACTIONS)?;

        let id = if id_or_hash.starts_with("0x") {
            let hash_table = read_txn.open_table(TX_HASH_INDEX)?;
            let found = hash_table
                .get(id_or_hash.to_lowercase().as_str())?
                .map(|v| v.value().to_string());
            match found {
                Some(id) => id,
                None => return Ok(None),
            }
        } else {
            id_or_hash.to_string()
        };

        match tx_table.get(id.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Paginated listing of a wallet's transactions, newest first.
    ///
    /// Returns `(transactions_with_direction, next_cursor)`.
    pub fn list_by_wallet(
        &self,
        address: &WalletAddress,
        cursor: Option<&str>,
        limit: usize,
    ) -> StoreResult<(Vec<(Transaction, Direction)>, Option<String>)> {
        let read_txn = self.db.begin_read()?;
        let idx_table = read_txn.open_table(WALLET_TX_INDEX)?;
        let tx_table = read_txn.open_table(TRANSACTIONS)?;

        let prefix = make_prefix(address);
        let prefix_end = make_prefix_end(address);

        // A cursor from another wallet's listing is ignored
        let start = cursor
            .and_then(decode_cursor)
            .filter(|key| key.starts_with(&prefix));
        let skip_first = start.is_some();
        let start = start.unwrap_or_else(|| prefix.clone());

        let mut results = Vec::with_capacity(limit.min(256));
        let mut last_key: Option<Vec<u8>> = None;
        let mut has_more = false;

        for (i, entry) in idx_table
            .range(start.as_slice()..prefix_end.as_slice())?
            .enumerate()
        {
            let (key, direction) = entry?;
            if skip_first && i == 0 && key.value() == start.as_slice() {
                continue;
            }
            if results.len() >= limit {
                has_more = true;
                break;
            }

            let key_bytes = key.value().to_vec();
            if let Some(id) = extract_id_from_key(&key_bytes, prefix.len()) {
                if let Some(value) = tx_table.get(id.as_str())? {
                    let tx: Transaction = serde_json::from_slice(value.value())?;
                    results.push((tx, Direction::parse(direction.value())?));
                    last_key = Some(key_bytes);
                }
            }
        }

        let next_cursor = if has_more {
            last_key.map(|k| encode_cursor(&k))
        } else {
            None
        };

        Ok((results, next_cursor))
    }
}

// =============================================================================
// Tests
// =============================================================================
