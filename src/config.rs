//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to deserialize environment variables into a type-safe struct.

use serde::Deserialize;
use std::time::Duration;

use crate::models::UserId;

/// Well-known id of the account that funds new users.
pub const DEFAULT_PRIMARY_USER_ID: &str = "00000000000000000000000000000000";

/// Where ledger state lives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Postgres,
    /// Process-local state, lost on restart
    Memory,
}

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `STORAGE_BACKEND` (optional): `postgres` (default) or `memory`
/// - `DATABASE_URL`: PostgreSQL connection string, required for `postgres`
/// - `DATABASE_MAX_CONNECTIONS` (optional): pool size, defaults to 10
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `LEDGER_TIMEOUT_MS` (optional): deadline for each ledger call, defaults to 3000
/// - `PRIMARY_USER_ID` (optional): id of the funding account
/// - `PRIMARY_BALANCE` (optional): issuance budget used when the funding account is created
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage_backend: StorageBackend,

    pub database_url: Option<String>,

    #[serde(default = "default_max_connections")]
    pub database_max_connections: u32,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_timeout_ms")]
    pub ledger_timeout_ms: u64,

    #[serde(default = "default_primary_user_id")]
    pub primary_user_id: String,

    #[serde(default = "default_primary_balance")]
    pub primary_balance: i64,
}

fn default_max_connections() -> u32 {
    10
}

fn default_port() -> u16 {
    3000
}

fn default_timeout_ms() -> u64 {
    3000
}

fn default_primary_user_id() -> String {
    DEFAULT_PRIMARY_USER_ID.to_string()
}

fn default_primary_balance() -> i64 {
    1_000_000_000_000
}

/// Configuration that parsed but cannot be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Env(#[from] envy::Error),

    #[error("DATABASE_URL must be set when STORAGE_BACKEND is postgres")]
    MissingDatabaseUrl,

    #[error("PRIMARY_BALANCE must not be negative")]
    NegativePrimaryBalance,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Loads an optional `.env` file first.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Environment variable values cannot be parsed into expected types
    /// - `DATABASE_URL` is missing for the postgres backend
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        envy::from_env::<Config>()?.validated()
    }

    fn validated(self) -> Result<Self, ConfigError> {
        if self.storage_backend == StorageBackend::Postgres && self.database_url.is_none() {
            return Err(ConfigError::MissingDatabaseUrl);
        }
        if self.primary_balance < 0 {
            return Err(ConfigError::NegativePrimaryBalance);
        }
        Ok(self)
    }

    pub fn ledger_timeout(&self) -> Duration {
        Duration::from_millis(self.ledger_timeout_ms)
    }

    pub fn primary_user_id(&self) -> UserId {
        UserId::new(self.primary_user_id.clone())
    }
}
