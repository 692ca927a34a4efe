// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Ledger Storage
//!
//! Persistent state lives in a single redb file with two logical tables,
//! wallets and the append-only transaction ledger, plus the indexes that
//! serve per-wallet history queries.
//!
//! ## Storage Layout
//!
//! ```text
//! $DATA_DIR/
//!   wallet.redb
//!     wallets          address -> Wallet JSON
//!     transactions     id -> Transaction JSON
//!     tx_hash_index    tx_hash -> id
//!     wallet_tx_index  address|!seq|id -> direction
//!     ledger_meta      next_seq
//! ```

pub mod database;
pub mod transactions;
pub mod wallets;

pub use database::{LedgerStore, LedgerWrite, StoreError, StoreResult};
pub use transactions::{Direction, Transaction, TxStatus};
pub use wallets::{Wallet, WalletResponse};
