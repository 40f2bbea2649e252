//! # Configuration
//!
//! Service configuration loaded once at startup from environment variables and
//! passed explicitly to every component that needs it.
//!
//! - `gateway`: admin API location, credentials, pinned plans, model auth conventions
//! - `workspace`: vector database selection and guard/safety toggles

mod gateway;
mod workspace;

pub use gateway::{GatewayConfig, ModelAuthTable};
pub use workspace::{FeatureToggles, VectorDbConfig};

use crate::constants::{DEFAULT_SERVER_PORT, DEFAULT_LOG_FILTER};
use std::str::FromStr;
use thiserror::Error;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),
    #[error("environment variable {var} is invalid: {reason}")]
    Invalid { var: String, reason: String },
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}' (expected text or json)")),
        }
    }
}

/// HTTP server and logging settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub log_format: LogFormat,
    /// Fallback tracing filter when `RUST_LOG` is not set
    pub log_filter: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_SERVER_PORT,
            log_format: LogFormat::Text,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

/// Complete service configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub gateway: GatewayConfig,
    pub model_auth: ModelAuthTable,
    pub vector_db: VectorDbConfig,
    pub toggles: FeatureToggles,
    pub server: ServerConfig,
}

impl AppConfig {
    /// Load configuration from the process environment
    ///
    /// # Errors
    /// Returns an error if a required variable is missing or a value does not parse
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    ///
    /// `from_env` delegates here; tests pass a map instead of mutating the process environment.
    ///
    /// # Errors
    /// Returns an error if a required variable is missing or a value does not parse
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server = ServerConfig {
            port: parse_or_default(&lookup, "SERVER_PORT", DEFAULT_SERVER_PORT)?,
            log_format: parse_or_default(&lookup, "LOG_FORMAT", LogFormat::Text)?,
            log_filter: lookup("RUST_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        };

        Ok(Self {
            gateway: GatewayConfig::from_lookup(&lookup)?,
            model_auth: ModelAuthTable::from_lookup(&lookup)?,
            vector_db: VectorDbConfig::from_lookup(&lookup),
            toggles: FeatureToggles::from_lookup(&lookup),
            server,
        })
    }
}

/// Read a required, non-empty variable
pub(crate) fn required<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(key))
}

/// Parse a variable, falling back to `default` when unset
pub(crate) fn parse_or_default<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var: key.to_string(),
            reason: e.to_string(),
        }),
    }
}

/// Read environment variable as boolean or return default
pub(crate) fn bool_or_default<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| {
            let v_lower = v.trim().to_lowercase();
            v_lower == "true" || v_lower == "1" || v_lower == "yes" || v_lower == "on"
        })
        .unwrap_or(default)
}
