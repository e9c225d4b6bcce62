//! Configuration and naming errors
//!
//! Typed errors for configuration validation and zone/region handling.

use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// message_count is zero
    #[error("message_count must be at least 1, got {0}")]
    InvalidMessageCount(u32),

    /// pull_timeout_secs is zero or above the supported maximum
    #[error("pull_timeout_secs must be between 1 and {max}, got {secs}")]
    InvalidPullTimeout { secs: u64, max: u64 },

    /// message_size is outside what the provider accepts
    #[error("message_size {size} is outside {min}..={max} bytes for provider {provider}")]
    InvalidMessageSize {
        provider: crate::config::Provider,
        size: usize,
        min: usize,
        max: usize,
    },

    /// region is not a valid region name
    #[error("invalid region: {0}")]
    InvalidRegion(#[source] ZoneError),

    /// Field-level validation failed
    #[error("invalid config: {0}")]
    Validation(#[from] garde::Report),

    /// Failed to parse JSON configuration
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// Failed to read configuration file
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Create an IO error with path context
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Zone and region naming errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ZoneError {
    #[error("{0} is not a valid AWS zone or region name")]
    InvalidName(String),

    #[error(
        "not all zones are in the same region: {expected} is not the same as {found} (zones: {})",
        zones.join(",")
    )]
    RegionMismatch {
        expected: String,
        found: String,
        zones: Vec<String>,
    },
}
