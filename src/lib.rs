//! vin-watch: alert on new web listings for a vehicle identification number
//!
//! This crate queries web search providers for exact-phrase matches of one or
//! more VINs, drops results already alerted on in a previous run, and notifies
//! only about newly observed listings.

pub mod config;
pub mod diff;
pub mod monitor;
pub mod notify;
pub mod search;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for vin-watch operations
#[derive(Debug, Error)]
pub enum VinError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("State error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

impl VinError {
    /// Process exit code for a run that aborted with this error
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            _ => 1,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Missing required setting: {0}")]
    Missing(String),

    #[error("Invalid value for {key}: {message}")]
    Invalid { key: String, message: String },

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for vin-watch operations
pub type Result<T> = std::result::Result<T, VinError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use diff::{compute_new, DiffOutcome};
pub use state::{BaselinePolicy, SeenState};
pub use url::normalize_url;
