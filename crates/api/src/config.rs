//! Configuration từ environment variables

use serde::Serialize;
use std::env;
use thiserror::Error;

pub use gatehouse_persistence::DEFAULT_DATABASE_URL;

pub const DEFAULT_IDENTITY_HEADER: &str = "x-user-id";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value}")]
    Invalid { var: String, value: String },

    #[error("validation error: {0}")]
    Validation(String),
}

/// Server configuration
#[derive(Clone, Serialize)]
pub struct GatehouseConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
    #[serde(skip)]
    pub webhook_secret: Option<String>,
    pub identity_header: String,
    pub webhook_tolerance_secs: u64,
    pub log_level: String,
}

impl std::fmt::Debug for GatehouseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatehouseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database_url", &self.database_url)
            .field("max_connections", &self.max_connections)
            .field("webhook_secret", &self.webhook_secret.as_ref().map(|_| "<redacted>"))
            .field("identity_header", &self.identity_header)
            .field("webhook_tolerance_secs", &self.webhook_tolerance_secs)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Default for GatehouseConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: 5,
            webhook_secret: None,
            identity_header: DEFAULT_IDENTITY_HEADER.to_string(),
            webhook_tolerance_secs: gatehouse_business::webhook::DEFAULT_TOLERANCE_SECS,
            log_level: "info".to_string(),
        }
    }
}

impl GatehouseConfig {
    /// Load config từ environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load config qua một hàm lookup (tests không phải đụng env của process)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let config = Self {
            host: get("GATEHOUSE_HOST").unwrap_or(defaults.host),
            port: parse_var(&get, "GATEHOUSE_PORT", defaults.port)?,
            database_url: get("DATABASE_URL").unwrap_or(defaults.database_url),
            max_connections: parse_var(&get, "GATEHOUSE_MAX_CONNECTIONS", defaults.max_connections)?,
            webhook_secret: get("IDENTITY_WEBHOOK_SECRET"),
            identity_header: get("GATEHOUSE_IDENTITY_HEADER")
                .map(|h| h.trim().to_ascii_lowercase())
                .unwrap_or(defaults.identity_header),
            webhook_tolerance_secs: parse_var(
                &get,
                "GATEHOUSE_WEBHOOK_TOLERANCE_SECS",
                defaults.webhook_tolerance_secs,
            )?,
            log_level: get("LOG_LEVEL").unwrap_or(defaults.log_level),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::Validation(
                "max_connections must be at least 1".to_string(),
            ));
        }
        if self.identity_header.is_empty() {
            return Err(ConfigError::Validation(
                "identity header name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Lấy địa chỉ bind đầy đủ
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<G, T>(get: &G, key: &str, default: T) -> Result<T, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match get(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            var: key.to_string(),
            value: raw,
        }),
        None => Ok(default),
    }
}
