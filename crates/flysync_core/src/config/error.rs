//! Configuration error types.

use crate::rest::RestError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Figment extraction or merge error.
    #[error("Configuration error: {0}")]
    Figment(#[from] figment::Error),

    /// A `.env` file exists but could not be loaded.
    #[error("Failed to load .env: {0}")]
    Dotenv(#[from] dotenvy::Error),

    /// A required configuration section is not configured.
    #[error("Configuration section '{section}' is not configured")]
    NotConfigured { section: String },

    /// A configuration field has an invalid value.
    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    /// The configuration service could not be reached or answered badly.
    #[error("Configuration service error: {0}")]
    Remote(#[from] RestError),
}
