//! Configuration error types.

use thiserror::Error;

/// Errors while loading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

/// Errors from semantic validation of loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port: {0}")]
    InvalidPort(u16),

    #[error("Invalid URL for {field}: {reason}")]
    InvalidUrl {
        field: &'static str,
        reason: String,
    },

    #[error("Database pool size must be at least 1")]
    InvalidPoolSize,

    #[error("Callback URL must use HTTPS outside development")]
    InsecureCallbackUrl,
}
