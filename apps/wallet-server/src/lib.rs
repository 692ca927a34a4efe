// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! ETH Mock Wallet - simulated Ethereum wallet service
//!
//! Wallet creation, balance tracking and signed ETH transfers against a local
//! ledger, with no blockchain behind it.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `storage` - redb-backed wallets and append-only transaction ledger
//! - `transfer` - signed, atomic balance transfers
//! - `crypto` - key generation and EIP-191 signature verification
//! - `oracle` - cached ETH→USD price client
//! - `notify` - queued email notifications

pub mod api;
pub mod config;
pub mod crypto;
pub mod error;
pub mod logging;
pub mod models;
pub mod notify;
pub mod oracle;
pub mod state;
pub mod storage;
pub mod transfer;
