//! Configuration types for the coordinator

use crate::retry::RetryPolicy;
use msgbench_common::defaults::DEFAULT_COMMAND_TIMEOUT_SECS;
use std::time::Duration;

/// How external commands are run
#[derive(Debug, Clone, PartialEq)]
pub struct CommandConfig {
    /// Per-attempt timeout (the process is killed when exceeded)
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
        }
    }
}

impl CommandConfig {
    pub fn with_timeout_secs(timeout_secs: u64) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_secs),
            ..Self::default()
        }
    }
}
