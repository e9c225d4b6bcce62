//! Benchmark configuration shared between coordinator and agent
//!
//! The coordinator (or an operator) writes this configuration as JSON; the
//! agent loads it, or assembles it from command-line flags, and validates it
//! before connecting to a queue.

use crate::defaults::{
    MAX_PULL_TIMEOUT_SECS, SQS_MAX_MESSAGE_SIZE, default_message_count, default_message_size,
    default_pull_timeout_secs, default_queue_name, default_region,
};
use crate::error::ConfigError;
use crate::scenario::Scenario;
use crate::zone;
use garde::Validate;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::Path;
use std::time::Duration;

/// Messaging backend to benchmark
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Amazon SQS
    #[default]
    #[strum(to_string = "sqs", serialize = "aws")]
    #[serde(alias = "aws")]
    Sqs,
    /// Process-local queue, for dry runs
    #[strum(to_string = "memory")]
    Memory,
}

impl Provider {
    /// Whether the backend lives in a cloud region
    pub fn is_regional(self) -> bool {
        matches!(self, Self::Sqs)
    }

    /// Message body sizes the backend accepts, in bytes
    pub fn message_size_range(self) -> RangeInclusive<usize> {
        match self {
            Self::Sqs => 1..=SQS_MAX_MESSAGE_SIZE,
            Self::Memory => 0..=usize::MAX,
        }
    }
}

/// Configuration for one benchmark phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct BenchmarkConfig {
    #[serde(default)]
    #[garde(skip)]
    pub provider: Provider,

    /// Region the queue lives in
    #[serde(default = "default_region")]
    #[garde(length(min = 1))]
    pub region: String,

    #[serde(default = "default_queue_name")]
    #[garde(length(min = 1, max = 80))]
    pub queue_name: String,

    #[garde(skip)]
    pub scenario: Scenario,

    /// Number of messages processed by the phase
    #[serde(default = "default_message_count")]
    #[garde(range(min = 1))]
    pub message_count: u32,

    /// Payload size in bytes; the allowed range depends on the provider
    #[serde(default = "default_message_size")]
    #[garde(skip)]
    pub message_size: usize,

    /// How long a single pull waits for a message
    #[serde(default = "default_pull_timeout_secs")]
    #[garde(range(min = 1, max = MAX_PULL_TIMEOUT_SECS))]
    pub pull_timeout_secs: u64,
}

impl BenchmarkConfig {
    /// Load and validate configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::io(path.display().to_string(), e))?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Validate field constraints, the provider's message size limits and,
    /// for regional providers, the region name
    pub fn validate_all(&self) -> Result<(), ConfigError> {
        if self.message_count == 0 {
            return Err(ConfigError::InvalidMessageCount(self.message_count));
        }
        if !(1..=MAX_PULL_TIMEOUT_SECS).contains(&self.pull_timeout_secs) {
            return Err(ConfigError::InvalidPullTimeout {
                secs: self.pull_timeout_secs,
                max: MAX_PULL_TIMEOUT_SECS,
            });
        }
        let sizes = self.provider.message_size_range();
        if !sizes.contains(&self.message_size) {
            return Err(ConfigError::InvalidMessageSize {
                provider: self.provider,
                size: self.message_size,
                min: *sizes.start(),
                max: *sizes.end(),
            });
        }
        self.validate()?;
        if self.provider.is_regional() {
            match zone::is_region(&self.region) {
                Ok(true) => {}
                Ok(false) => {
                    return Err(ConfigError::InvalidRegion(
                        crate::error::ZoneError::InvalidName(self.region.clone()),
                    ));
                }
                Err(e) => return Err(ConfigError::InvalidRegion(e)),
            }
        }
        Ok(())
    }

    pub fn pull_timeout(&self) -> Duration {
        Duration::from_secs(self.pull_timeout_secs)
    }
}
