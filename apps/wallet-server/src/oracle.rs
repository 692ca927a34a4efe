// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # ETH→USD Price Oracle
//!
//! Fetches the ETH price from a CoinGecko-style simple price endpoint and
//! keeps the last successful value in a [`PriceCache`].
//!
//! ## Resolution Order
//!
//! 1. Cached value younger than the TTL → served as `cached`, not stale.
//! 2. Otherwise fetch. Success → `live`, cache refreshed.
//! 3. Fetch failed and the cached value is within TTL + grace → `cached`, stale.
//! 4. Nothing usable → rate `0`, `fallback`, stale.
//!
//! The oracle never returns an error to its callers; degraded quality is
//! reported on the quote instead.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use utoipa::ToSchema;

/// Upstream request timeout.
const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("price request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("price payload is malformed: {0}")]
    Malformed(String),
}

/// Where a quote's rate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    Live,
    Cached,
    Fallback,
}

/// ETH→USD rate with its provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PriceQuote {
    /// USD per ETH (0 when no rate is available)
    pub eth_usd: Decimal,
    pub source: PriceSource,
    /// True when the rate is older than the freshness window or absent
    pub stale: bool,
}

impl PriceQuote {
    /// Whether the quote carries a real rate.
    pub fn is_available(&self) -> bool {
        self.source != PriceSource::Fallback
    }

    /// USD value of `eth`. `None` without a rate or when the product is out
    /// of `Decimal` range.
    pub fn eth_to_usd(&self, eth: Decimal) -> Option<Decimal> {
        if !self.is_available() {
            return None;
        }
        eth.checked_mul(self.eth_usd).map(|usd| usd.round_dp(2))
    }

    pub fn usd_to_eth(&self, usd: Decimal) -> Option<Decimal> {
        if !self.is_available() || self.eth_usd.is_zero() {
            return None;
        }
        usd.checked_div(self.eth_usd).map(|eth| eth.round_dp(18))
    }
}

// =============================================================================
// Cache
// =============================================================================

/// Last successful fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedPrice {
    pub value: Decimal,
    pub fetched_at: Instant,
}

/// Explicit price cache with a freshness window and a stale grace window.
#[derive(Debug)]
pub struct PriceCache {
    entry: Mutex<Option<CachedPrice>>,
    ttl: Duration,
    grace: Duration,
}

impl PriceCache {
    pub fn new(ttl: Duration, grace: Duration) -> Self {
        Self {
            entry: Mutex::new(None),
            ttl,
            grace,
        }
    }

    /// Cached value if younger than the TTL at `now`.
    pub fn fresh(&self, now: Instant) -> Option<Decimal> {
        self.peek()
            .filter(|c| now.saturating_duration_since(c.fetched_at) < self.ttl)
            .map(|c| c.value)
    }

    /// Cached value if younger than TTL + grace at `now`.
    pub fn usable(&self, now: Instant) -> Option<Decimal> {
        self.peek()
            .filter(|c| now.saturating_duration_since(c.fetched_at) < self.ttl + self.grace)
            .map(|c| c.value)
    }

    pub fn store(&self, value: Decimal, fetched_at: Instant) {
        if let Ok(mut entry) = self.entry.lock() {
            *entry = Some(CachedPrice { value, fetched_at });
        }
    }

    pub fn peek(&self) -> Option<CachedPrice> {
        self.entry.lock().ok().and_then(|entry| *entry)
    }
}

// =============================================================================
// Client
// =============================================================================

#[derive(Deserialize)]
struct SimplePriceResponse {
    ethereum: SimplePrice,
}

#[derive(Deserialize)]
struct SimplePrice {
    usd: f64,
}

/// HTTP price oracle client.
pub struct PriceOracle {
    http: reqwest::Client,
    url: String,
    cache: PriceCache,
}

impl PriceOracle {
    pub fn new(url: impl Into<String>, ttl: Duration, grace: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to default HTTP client for price oracle");
                reqwest::Client::new()
            });
        Self {
            http,
            url: url.into(),
            cache: PriceCache::new(ttl, grace),
        }
    }

    pub fn cache(&self) -> &PriceCache {
        &self.cache
    }

    /// Current ETH→USD quote. Never fails; see the module docs.
    pub async fn eth_usd_rate(&self) -> PriceQuote {
        if let Some(value) = self.cache.fresh(Instant::now()) {
            return PriceQuote {
                eth_usd: value,
                source: PriceSource::Cached,
                stale: false,
            };
        }

        match self.fetch().await {
            Ok(value) => {
                self.cache.store(value, Instant::now());
                debug!(eth_usd = %value, "Fetched ETH price");
                PriceQuote {
                    eth_usd: value,
                    source: PriceSource::Live,
                    stale: false,
                }
            }
            Err(e) => {
                warn!(error = %e, url = %self.url, "ETH price fetch failed");
                match self.cache.usable(Instant::now()) {
                    Some(value) => PriceQuote {
                        eth_usd: value,
                        source: PriceSource::Cached,
                        stale: true,
                    },
                    None => PriceQuote {
                        eth_usd: Decimal::ZERO,
                        source: PriceSource::Fallback,
                        stale: true,
                    },
                }
            }
        }
    }

    async fn fetch(&self) -> Result<Decimal, OracleError> {
        let body: SimplePriceResponse = self
            .http
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let usd = body.ethereum.usd;
        if !usd.is_finite() || usd <= 0.0 {
            return Err(OracleError::Malformed(format!("non-positive price {usd}")));
        }
        Decimal::from_f64(usd)
            .ok_or_else(|| OracleError::Malformed(format!("unrepresentable price {usd}")))
    }
}
