// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded ledger database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `wallets`: lowercase address → serialized [`Wallet`](super::Wallet)
//! - `transactions`: transaction id → serialized [`Transaction`](super::Transaction)
//! - `tx_hash_index`: tx_hash → transaction id
//! - `wallet_tx_index`: composite key (address|!seq|id) → direction
//! - `ledger_meta`: key → u64 counters
//!
//! redb admits a single write transaction at a time. Every balance mutation
//! goes through [`LedgerStore::write`], so a transfer's reads, checks and
//! writes observe no concurrent writer and commit as one unit.

use std::path::Path;

use redb::{
    Database, ReadableDatabase, ReadableTable, Table, TableDefinition, WriteTransaction,
};

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary wallet table: address → JSON bytes.
pub(super) const WALLETS: TableDefinition<&str, &[u8]> = TableDefinition::new("wallets");

/// Primary ledger table: transaction id → JSON bytes.
pub(super) const TRANSACTIONS: TableDefinition<&str, &[u8]> =
    TableDefinition::new("transactions");

/// Lookup: tx_hash → transaction id.
pub(super) const TX_HASH_INDEX: TableDefinition<&str, &str> =
    TableDefinition::new("tx_hash_index");

/// Index: composite key → direction ("sent"|"received").
/// Key format: `address|!seq_be|id` for newest-first range scans.
pub(super) const WALLET_TX_INDEX: TableDefinition<&[u8], &str> =
    TableDefinition::new("wallet_tx_index");

/// Counters: key → u64 (e.g. "next_seq").
pub(super) const LEDGER_META: TableDefinition<&str, u64> = TableDefinition::new("ledger_meta");

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("balance of {address} would become negative ({balance})")]
    NegativeBalance {
        address: String,
        balance: rust_decimal::Decimal,
    },

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// LedgerStore
// =============================================================================

/// Persistent wallet and transaction store.
pub struct LedgerStore {
    pub(super) db: Database,
}

/// Open tables of a single write transaction.
///
/// Handed to the closure passed to [`LedgerStore::write`]; wallet and ledger
/// operations on it are implemented next to their record types.
pub struct LedgerWrite<'txn> {
    pub(super) wallets: Table<'txn, &'static str, &'static [u8]>,
    pub(super) transactions: Table<'txn, &'static str, &'static [u8]>,
    pub(super) tx_hash_index: Table<'txn, &'static str, &'static str>,
    pub(super) wallet_tx_index: Table<'txn, &'static [u8], &'static str>,
    pub(super) meta: Table<'txn, &'static str, u64>,
}

impl LedgerStore {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(WALLETS)?;
            let _ = write_txn.open_table(TRANSACTIONS)?;
            let _ = write_txn.open_table(TX_HASH_INDEX)?;
            let _ = write_txn.open_table(WALLET_TX_INDEX)?;
            let _ = write_txn.open_table(LEDGER_META)?;
        }
        write_txn.commit()?;

        tracing::info!(path = %path.display(), "Ledger database opened");
        Ok(Self { db })
    }

    /// Run `f` inside one write transaction.
    ///
    /// Commits when `f` returns `Ok`, aborts (discarding every write made by
    /// `f`) when it returns `Err`.
    pub fn write<T, E, F>(&self, f: F) -> Result<T, E>
    where
        E: From<StoreError>,
        F: FnOnce(&mut LedgerWrite<'_>) -> Result<T, E>,
    {
        let txn = self.db.begin_write().map_err(StoreError::from)?;
        let outcome = run_in(&txn, f);
        match outcome {
            Ok(value) => {
                txn.commit().map_err(StoreError::from)?;
                Ok(value)
            }
            Err(e) => {
                if let Err(abort_err) = txn.abort() {
                    tracing::warn!(error = %abort_err, "Failed to abort ledger write");
                }
                Err(e)
            }
        }
    }

    /// Cheap readiness probe: open a read transaction and the wallet table.
    pub fn ping(&self) -> StoreResult<()> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(WALLETS)?;
        let _ = table.first()?;
        Ok(())
    }
}

/// Open every table on `txn`, run `f`, and drop the tables before returning
/// so the transaction can be committed or aborted.
fn run_in<T, E, F>(txn: &WriteTransaction, f: F) -> Result<T, E>
where
    E: From<StoreError>,
    F: FnOnce(&mut LedgerWrite<'_>) -> Result<T, E>,
{
    let mut tables = LedgerWrite {
        wallets: txn.open_table(WALLETS).map_err(StoreError::from)?,
        transactions: txn.open_table(TRANSACTIONS).map_err(StoreError::from)?,
        tx_hash_index: txn.open_table(TX_HASH_INDEX).map_err(StoreError::from)?,
        wallet_tx_index: txn.open_table(WALLET_TX_INDEX).map_err(StoreError::from)?,
        meta: txn.open_table(LEDGER_META).map_err(StoreError::from)?,
    };
    f(&mut tables)
}

impl LedgerWrite<'_> {
    /// Allocate the next ledger sequence number.
    pub(super) fn next_seq(&mut self) -> StoreResult<u64> {
        let current = self.meta.get("next_seq")?.map(|v| v.value()).unwrap_or(0);
        self.meta.insert("next_seq", current + 1)?;
        Ok(current)
    }
}

// =============================================================================
// Tests
// =============================================================================
