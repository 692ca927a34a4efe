// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Shared Data Models
//!
//! ## Wallet Address Type
//!
//! The [`WalletAddress`] newtype wraps Ethereum-style addresses (0x-prefixed,
//! 40 hex characters). Addresses are normalized to lowercase on parse so the
//! store and the ledger index compare them case-insensitively.

use std::{fmt, str::FromStr};

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Ethereum-compatible wallet address wrapper.
///
/// Always holds the lowercase `0x` + 40 hex form.
///
/// # Example
///
/// ```rust,ignore
/// let addr: WalletAddress = "0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12".parse()?;
/// assert_eq!(addr.as_str(), "0x742d35cc6634c0532925a3b844bc9e7595f4ab12");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct WalletAddress(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid Ethereum address `{0}`")]
pub struct InvalidAddress(pub String);

impl WalletAddress {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The address as alloy's 20-byte primitive.
    pub fn to_primitive(&self) -> Address {
        // The inner string was validated on construction.
        Address::from_str(&self.0).unwrap_or(Address::ZERO)
    }
}

impl From<Address> for WalletAddress {
    fn from(value: Address) -> Self {
        WalletAddress(alloy::hex::encode_prefixed(value.as_slice()))
    }
}

impl FromStr for WalletAddress {
    type Err = InvalidAddress;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if !trimmed.starts_with("0x") || trimmed.len() != 42 {
            return Err(InvalidAddress(s.to_string()));
        }
        let address = Address::from_str(trimmed).map_err(|_| InvalidAddress(s.to_string()))?;
        Ok(address.into())
    }
}

impl TryFrom<String> for WalletAddress {
    type Error = InvalidAddress;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<WalletAddress> for String {
    fn from(value: WalletAddress) -> Self {
        value.0
    }
}
