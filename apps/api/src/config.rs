//! API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// HTTP server port
    pub http_port: u16,

    /// Path to the SQLite database file
    pub database_path: String,

    /// Format cache TTL in seconds
    ///
    /// Format edits are rare and allocation is frequent; a few seconds of
    /// staleness only affects how numbers look, never their uniqueness.
    pub format_cache_ttl_secs: u64,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = ApiConfig {
            http_port: env::var("HTTP_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("HTTP_PORT".to_string()))?,

            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "./fixdesk.db".to_string()),

            format_cache_ttl_secs: env::var("FORMAT_CACHE_TTL_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("FORMAT_CACHE_TTL_SECS".to_string()))?,
        };

        Ok(config)
    }

    /// The cache TTL as a Duration.
    pub fn format_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.format_cache_ttl_secs)
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        // Clear any ambient configuration so defaults are what load() sees
        for key in ["HTTP_PORT", "DATABASE_PATH", "FORMAT_CACHE_TTL_SECS"] {
            env::remove_var(key);
        }

        let config = ApiConfig::load().unwrap();
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.database_path, "./fixdesk.db");
        assert_eq!(config.format_cache_ttl(), Duration::from_secs(10));
    }
}
