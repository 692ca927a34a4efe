// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values, and the
//! typed [`Config`] loaded once at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `5000` |
//! | `DATA_DIR` | Directory holding `wallet.redb` | `./data` |
//! | `PRICE_API_URL` | ETH→USD simple-price endpoint | CoinGecko |
//! | `PRICE_CACHE_TTL_SECS` | Price freshness window | `60` |
//! | `PRICE_CACHE_GRACE_SECS` | Stale price grace window on fetch failure | `600` |
//! | `INITIAL_BALANCE` | ETH credited to new wallets | `100` |
//! | `SMTP_SERVER` | SMTP relay host (STARTTLS) | `smtp.gmail.com` |
//! | `SMTP_PORT` | SMTP relay port | `587` |
//! | `SMTP_EMAIL` | Sender address and SMTP username | unset (notifications off) |
//! | `SMTP_PASSWORD` | SMTP password | unset (notifications off) |
//! | `NOTIFY_QUEUE_CAPACITY` | Bounded notification queue size | `64` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::{path::PathBuf, str::FromStr, time::Duration};

use rust_decimal::Decimal;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the data directory.
///
/// The redb ledger file lives directly under it.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

pub const PRICE_API_URL_ENV: &str = "PRICE_API_URL";
pub const PRICE_CACHE_TTL_ENV: &str = "PRICE_CACHE_TTL_SECS";
pub const PRICE_CACHE_GRACE_ENV: &str = "PRICE_CACHE_GRACE_SECS";
pub const INITIAL_BALANCE_ENV: &str = "INITIAL_BALANCE";
pub const SMTP_SERVER_ENV: &str = "SMTP_SERVER";
pub const SMTP_PORT_ENV: &str = "SMTP_PORT";
pub const SMTP_EMAIL_ENV: &str = "SMTP_EMAIL";
pub const SMTP_PASSWORD_ENV: &str = "SMTP_PASSWORD";
pub const NOTIFY_QUEUE_CAPACITY_ENV: &str = "NOTIFY_QUEUE_CAPACITY";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DATABASE_FILE: &str = "wallet.redb";

/// CoinGecko simple price endpoint for ETH in USD.
pub const DEFAULT_PRICE_API_URL: &str =
    "https://api.coingecko.com/api/v3/simple/price?ids=ethereum&vs_currencies=usd";

pub const DEFAULT_PRICE_CACHE_TTL: Duration = Duration::from_secs(60);
pub const DEFAULT_PRICE_CACHE_GRACE: Duration = Duration::from_secs(600);
pub const DEFAULT_INITIAL_BALANCE: Decimal = Decimal::ONE_HUNDRED;
pub const DEFAULT_SMTP_SERVER: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;
pub const DEFAULT_NOTIFY_QUEUE_CAPACITY: usize = 64;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} has an invalid value `{value}`: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// SMTP relay settings. Present only when both credentials are configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpConfig {
    pub server: String,
    pub port: u16,
    pub email: String,
    pub password: String,
}

/// Fully resolved service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub price_api_url: String,
    pub price_cache_ttl: Duration,
    pub price_cache_grace: Duration,
    pub initial_balance: Decimal,
    pub smtp: Option<SmtpConfig>,
    pub notify_queue_capacity: usize,
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let price_api_url = var(PRICE_API_URL_ENV).unwrap_or_else(|| DEFAULT_PRICE_API_URL.into());
        url::Url::parse(&price_api_url).map_err(|e| ConfigError::Invalid {
            name: PRICE_API_URL_ENV,
            value: price_api_url.clone(),
            reason: e.to_string(),
        })?;

        let initial_balance: Decimal = parse_or(&var, INITIAL_BALANCE_ENV, DEFAULT_INITIAL_BALANCE)?;
        if initial_balance.is_sign_negative() {
            return Err(ConfigError::Invalid {
                name: INITIAL_BALANCE_ENV,
                value: initial_balance.to_string(),
                reason: "must not be negative".into(),
            });
        }

        let smtp = match (var(SMTP_EMAIL_ENV), var(SMTP_PASSWORD_ENV)) {
            (Some(email), Some(password)) => Some(SmtpConfig {
                server: var(SMTP_SERVER_ENV).unwrap_or_else(|| DEFAULT_SMTP_SERVER.into()),
                port: parse_or(&var, SMTP_PORT_ENV, DEFAULT_SMTP_PORT)?,
                email,
                password,
            }),
            _ => None,
        };

        let notify_queue_capacity =
            parse_or(&var, NOTIFY_QUEUE_CAPACITY_ENV, DEFAULT_NOTIFY_QUEUE_CAPACITY)?.max(1);

        let log_format = match var(LOG_FORMAT_ENV).as_deref() {
            Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            host: var(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.into()),
            port: parse_or(&var, PORT_ENV, DEFAULT_PORT)?,
            data_dir: var(DATA_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            price_api_url,
            price_cache_ttl: Duration::from_secs(parse_or(
                &var,
                PRICE_CACHE_TTL_ENV,
                DEFAULT_PRICE_CACHE_TTL.as_secs(),
            )?),
            price_cache_grace: Duration::from_secs(parse_or(
                &var,
                PRICE_CACHE_GRACE_ENV,
                DEFAULT_PRICE_CACHE_GRACE.as_secs(),
            )?),
            initial_balance,
            smtp,
            notify_queue_capacity,
            log_format,
        })
    }

    /// Path of the redb ledger file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T, F>(var: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match var(name) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            value: raw,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:5000");
        assert_eq!(config.database_path(), PathBuf::from("./data/wallet.redb"));
        assert_eq!(config.price_api_url, DEFAULT_PRICE_API_URL);
        assert_eq!(config.price_cache_ttl, Duration::from_secs(60));
        assert_eq!(config.initial_balance, Decimal::from(100));
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.smtp.is_none());
    }

    #[test]
    fn smtp_requires_both_credentials() {
        let only_email = load(&[(SMTP_EMAIL_ENV, "bot@example.com")]).unwrap();
        assert!(only_email.smtp.is_none());

        let both = load(&[
            (SMTP_EMAIL_ENV, "bot@example.com"),
            (SMTP_PASSWORD_ENV, "hunter2"),
            (SMTP_PORT_ENV, "2525"),
        ])
        .unwrap();
        let smtp = both.smtp.unwrap();
        assert_eq!(smtp.server, DEFAULT_SMTP_SERVER);
        assert_eq!(smtp.port, 2525);
    }

    #[test]
    fn blank_values_are_treated_as_unset() {
        let config = load(&[(SMTP_EMAIL_ENV, "a@b.c"), (SMTP_PASSWORD_ENV, "  ")]).unwrap();
        assert!(config.smtp.is_none());
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let err = load(&[(PORT_ENV, "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: PORT_ENV, .. }));

        let err = load(&[(INITIAL_BALANCE_ENV, "-5")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: INITIAL_BALANCE_ENV, .. }));
    }

    #[test]
    fn invalid_price_url_is_rejected() {
        let err = load(&[(PRICE_API_URL_ENV, "not a url")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: PRICE_API_URL_ENV, .. }));
    }

    #[test]
    fn json_log_format_is_case_insensitive() {
        let config = load(&[(LOG_FORMAT_ENV, "JSON")]).unwrap();
        assert_eq!(config.log_format, LogFormat::Json);
    }
}
