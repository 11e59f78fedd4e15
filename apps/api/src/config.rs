//! API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults. A `.env` file in the working directory is read first, if present.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use tienda_core::Money;
use tienda_db::{DbConfig, SimulatedMode};

/// How the simulated payment gateway decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    Approve,
    Decline,
    /// Decline when the order total exceeds `payment_decline_above_cents`.
    DeclineAbove,
}

/// API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// HTTP server port
    pub http_port: u16,

    /// SQLite database file (or `:memory:`)
    pub database_path: PathBuf,

    /// Pool size
    pub db_max_connections: u32,

    /// Simulated gateway behaviour
    pub payment_mode: PaymentMode,

    /// Limit for `PaymentMode::DeclineAbove`
    pub payment_decline_above_cents: Option<i64>,
}

impl ApiConfig {
    /// Load configuration from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        // A missing .env is normal outside development
        let _ = dotenvy::dotenv();
        Self::from_vars(&env::vars().collect())
    }

    /// Builds the configuration from an explicit variable map.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |key: &str| vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

        let config = ApiConfig {
            http_port: get("HTTP_PORT")
                .unwrap_or("8080")
                .parse()
                .map_err(|_| ConfigError::InvalidValue("HTTP_PORT".to_string()))?,

            database_path: PathBuf::from(get("DATABASE_PATH").unwrap_or("tienda.db")),

            db_max_connections: get("DB_MAX_CONNECTIONS")
                .unwrap_or("5")
                .parse()
                .ok()
                .filter(|n: &u32| *n > 0)
                .ok_or_else(|| ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()))?,

            payment_mode: match get("PAYMENT_MODE").unwrap_or("approve") {
                "approve" => PaymentMode::Approve,
                "decline" => PaymentMode::Decline,
                "decline_above" => PaymentMode::DeclineAbove,
                _ => return Err(ConfigError::InvalidValue("PAYMENT_MODE".to_string())),
            },

            payment_decline_above_cents: get("PAYMENT_DECLINE_ABOVE_CENTS")
                .map(|v| {
                    v.parse::<i64>()
                        .ok()
                        .filter(|cents| *cents >= 0)
                        .ok_or_else(|| {
                            ConfigError::InvalidValue("PAYMENT_DECLINE_ABOVE_CENTS".to_string())
                        })
                })
                .transpose()?,
        };

        if config.payment_mode == PaymentMode::DeclineAbove
            && config.payment_decline_above_cents.is_none()
        {
            return Err(ConfigError::MissingRequired(
                "PAYMENT_DECLINE_ABOVE_CENTS".to_string(),
            ));
        }

        Ok(config)
    }

    /// Database settings derived from this configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path).max_connections(self.db_max_connections)
    }

    /// Simulated gateway settings derived from this configuration.
    pub fn simulated_mode(&self) -> SimulatedMode {
        match (self.payment_mode, self.payment_decline_above_cents) {
            (PaymentMode::Approve, _) => SimulatedMode::ApproveAll,
            (PaymentMode::Decline, _) => SimulatedMode::DeclineAll,
            (PaymentMode::DeclineAbove, Some(cents)) => {
                SimulatedMode::DeclineAbove(Money::from_cents(cents))
            }
            // rejected by from_vars
            (PaymentMode::DeclineAbove, None) => SimulatedMode::ApproveAll,
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
