//! API configuration
//!
//! Loaded from `LEDGER_`-prefixed environment variables, e.g.
//! `LEDGER_PORT=8080` or `LEDGER_STORE=memory`.

use std::str::FromStr;

use serde::Deserialize;

use core_kernel::{Currency, MoneyError};

/// Which ledger store backs the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Postgres,
    Memory,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Database URL, used when `store` is `postgres`
    pub database_url: String,
    /// Log level or `EnvFilter` directive
    pub log_level: String,
    pub log_format: LogFormat,
    pub store: StoreKind,
    /// ISO code for documents submitted without a currency
    pub default_currency: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_url: "postgres://localhost/ledger".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            store: StoreKind::Postgres,
            default_currency: "USD".to_string(),
            max_connections: 10,
            min_connections: 2,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("LEDGER").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn currency(&self) -> Result<Currency, MoneyError> {
        Currency::from_str(&self.default_currency)
    }
}
