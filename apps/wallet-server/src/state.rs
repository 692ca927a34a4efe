// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::{
    notify::NotificationQueue, oracle::PriceOracle, storage::LedgerStore,
    transfer::TransferEngine,
};

/// Shared handles passed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<LedgerStore>,
    pub oracle: Arc<PriceOracle>,
    pub engine: Arc<TransferEngine>,
    pub notifications: NotificationQueue,
    /// Balance credited to newly created wallets
    pub initial_balance: Decimal,
}

impl AppState {
    pub fn new(
        store: LedgerStore,
        oracle: PriceOracle,
        notifications: NotificationQueue,
        initial_balance: Decimal,
    ) -> Self {
        let store = Arc::new(store);
        let oracle = Arc::new(oracle);
        let engine = Arc::new(TransferEngine::new(
            store.clone(),
            oracle.clone(),
            notifications.clone(),
        ));
        Self {
            store,
            oracle,
            engine,
            notifications,
            initial_balance,
        }
    }
}
