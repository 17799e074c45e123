//! Configuration module for environment variable parsing.
//!
//! All configuration is read once at startup. Business logic receives the
//! values through [`Config`] and never touches the process environment.

use std::env;

use thiserror::Error;
use tracing::warn;

/// Errors raised while loading required configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Shared secret used to verify webhook signatures and answer the
    /// URL validation handshake
    pub secret_token: String,

    /// AES-256 key (hex) for participant display names
    pub encryption_key: String,

    /// Postgres connection URL. The in-memory store is used when absent.
    pub database_url: Option<String>,

    /// Maximum number of pooled database connections
    pub database_max_connections: u32,

    /// Reject unsigned requests before they reach the dispatcher
    pub require_signature: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret_token = required(&lookup, "SECRET_TOKEN")?;

        let encryption_key = required(&lookup, "ENCRYPTION_KEY")?;
        if encryption_key.len() != 64 || hex::decode(&encryption_key).is_err() {
            return Err(ConfigError::Invalid {
                name: "ENCRYPTION_KEY",
                reason: "expected 64 hex characters".to_string(),
            });
        }

        Ok(Config {
            port: parse_or(&lookup, "PORT", 8080),

            secret_token,

            encryption_key,

            database_url: lookup("DATABASE_URL").filter(|v| !v.trim().is_empty()),

            database_max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 5),

            require_signature: parse_bool(&lookup, "REQUIRE_SIGNATURE", true),
        })
    }
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

/// Parse an optional value, falling back to `default` when absent or invalid.
fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let raw = match lookup(name) {
        Some(v) => v,
        None => return default,
    };

    match raw.trim().parse() {
        Ok(v) => v,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid value, using default");
            default
        }
    }
}

/// Parse a boolean flag such as "true", "0" or "no".
fn parse_bool<F>(lookup: &F, name: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    let raw = match lookup(name) {
        Some(v) => v,
        None => return default,
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => {
            warn!(env_var = name, value = %raw, "Invalid flag, using default");
            default
        }
    }
}
