// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet records in the ledger database.
//!
//! Balances are only ever changed through [`LedgerWrite::update_balance`],
//! which refuses to store a negative balance.

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::database::{LedgerStore, LedgerWrite, StoreError, StoreResult, WALLETS};
use crate::models::WalletAddress;

/// Wallet record stored in the `wallets` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    /// Lowercase Ethereum address (primary key)
    pub address: WalletAddress,
    /// Current ETH balance, never negative
    pub balance: Decimal,
    /// Number of completed outgoing transfers
    pub nonce: u64,
    /// Optional notification address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// When the wallet was created
    pub created_at: DateTime<Utc>,
    /// When the balance last changed
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    pub fn new(address: WalletAddress, balance: Decimal, email: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            address,
            balance,
            nonce: 0,
            email,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Response returned to API clients (never includes the email).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WalletResponse {
    /// Wallet address
    pub address: WalletAddress,
    /// Balance in ETH
    pub balance: Decimal,
    /// Nonce the next transfer message must carry
    pub nonce: u64,
    /// When the wallet was created
    pub created_at: DateTime<Utc>,
}

impl From<Wallet> for WalletResponse {
    fn from(wallet: Wallet) -> Self {
        Self {
            address: wallet.address,
            balance: wallet.balance,
            nonce: wallet.nonce,
            created_at: wallet.created_at,
        }
    }
}

// =============================================================================
// Operations inside a write transaction
// =============================================================================

impl LedgerWrite<'_> {
    /// Look up a wallet, returning `None` when absent.
    pub fn find_wallet(&self, address: &WalletAddress) -> StoreResult<Option<Wallet>> {
        match self.wallets.get(address.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Look up a wallet, failing with `NotFound` when absent.
    pub fn wallet(&self, address: &WalletAddress) -> StoreResult<Wallet> {
        self.find_wallet(address)?
            .ok_or_else(|| StoreError::NotFound(format!("Wallet {address}")))
    }

    /// Insert a new wallet. Fails with `AlreadyExists` on address collision.
    pub fn insert_wallet(&mut self, wallet: &Wallet) -> StoreResult<()> {
        if self.find_wallet(&wallet.address)?.is_some() {
            return Err(StoreError::AlreadyExists(format!("Wallet {}", wallet.address)));
        }
        if wallet.balance < Decimal::ZERO {
            return Err(StoreError::NegativeBalance {
                address: wallet.address.to_string(),
                balance: wallet.balance,
            });
        }
        self.put_wallet(wallet)
    }

    /// Set a wallet's balance and persist it.
    pub fn update_balance(&mut self, wallet: &mut Wallet, new_balance: Decimal) -> StoreResult<()> {
        if new_balance < Decimal::ZERO {
            return Err(StoreError::NegativeBalance {
                address: wallet.address.to_string(),
                balance: new_balance,
            });
        }
        wallet.balance = new_balance;
        wallet.updated_at = Utc::now();
        self.put_wallet(wallet)
    }

    /// Persist a wallet record as-is.
    pub(crate) fn put_wallet(&mut self, wallet: &Wallet) -> StoreResult<()> {
        let json = serde_json::to_vec(wallet)?;
        self.wallets.insert(wallet.address.as_str(), json.as_slice())?;
        Ok(())
    }
}

// =============================================================================
// Standalone operations
// =============================================================================

impl LedgerStore {
    /// Create a wallet with the given starting balance.
    pub fn create_wallet(
        &self,
        address: WalletAddress,
        email: Option<String>,
        initial_balance: Decimal,
    ) -> StoreResult<Wallet> {
        let wallet = Wallet::new(address, initial_balance, email);
        self.write(|w| -> StoreResult<()> { w.insert_wallet(&wallet) })?;
        Ok(wallet)
    }

    /// Get a wallet by address.
    pub fn get_wallet(&self, address: &WalletAddress) -> StoreResult<Wallet> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(WALLETS)?;
        match table.get(address.as_str())? {
            Some(value) => Ok(serde_json::from_slice(value.value())?),
            None => Err(StoreError::NotFound(format!("Wallet {address}"))),
        }
    }

    /// Overwrite a wallet's balance.
    pub fn update_balance(&self, address: &WalletAddress, new_balance: Decimal) -> StoreResult<Wallet> {
        self.write(|w| -> StoreResult<Wallet> {
            let mut wallet = w.wallet(address)?;
            w.update_balance(&mut wallet, new_balance)?;
            Ok(wallet)
        })
    }

    /// List all wallets ordered by address.
    pub fn list_wallets(&self) -> StoreResult<Vec<Wallet>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(WALLETS)?;
        let mut wallets = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            wallets.push(serde_json::from_slice(value.value())?);
        }
        Ok(wallets)
    }

    /// Sum of every wallet balance.
    pub fn total_balance(&self) -> StoreResult<Decimal> {
        Ok(self.list_wallets()?.iter().map(|w| w.balance).sum())
    }
}
