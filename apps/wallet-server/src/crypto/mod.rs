// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ethereum-compatible key generation and signature verification.
//!
//! All elliptic-curve work is delegated to `k256` and `alloy`.

pub mod keys;
pub mod signature;

pub use keys::{generate_keypair, GeneratedKey};
pub use signature::{transfer_message, verify_signature};
