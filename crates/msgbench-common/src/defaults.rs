//! Default configuration values shared between agent and coordinator
//!
//! These constants keep the agent's benchmark defaults and the coordinator's
//! provisioning defaults consistent.

use std::time::Duration;

/// Default AWS region for queues and provisioning
pub const DEFAULT_REGION: &str = "us-west-1";

/// Default queue name
pub const DEFAULT_QUEUE_NAME: &str = "msgbench-queue";

/// Default number of messages per phase
pub const DEFAULT_MESSAGE_COUNT: u32 = 100;

/// Default message payload size in bytes
pub const DEFAULT_MESSAGE_SIZE: usize = 10;

/// Default time a single pull waits for a message, in seconds
pub const DEFAULT_PULL_TIMEOUT_SECS: u64 = 10;

/// Longest time a single pull may wait for a message, in seconds
pub const MAX_PULL_TIMEOUT_SECS: u64 = 3600;

/// Largest message body SQS accepts, in bytes
pub const SQS_MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Default timeout for a single external command attempt, in seconds
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 300;

/// Default number of attempts (first run included) for retryable commands
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default initial backoff delay between command attempts
pub const DEFAULT_RETRY_MIN_DELAY: Duration = Duration::from_secs(1);

/// Default cap for the backoff delay between command attempts
pub const DEFAULT_RETRY_MAX_DELAY: Duration = Duration::from_secs(30);

// Serde default functions for struct field defaults

/// Returns the default region
pub fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

/// Returns the default queue name
pub fn default_queue_name() -> String {
    DEFAULT_QUEUE_NAME.to_string()
}

/// Returns the default message count
pub fn default_message_count() -> u32 {
    DEFAULT_MESSAGE_COUNT
}

/// Returns the default message size
pub fn default_message_size() -> usize {
    DEFAULT_MESSAGE_SIZE
}

/// Returns the default pull timeout
pub fn default_pull_timeout_secs() -> u64 {
    DEFAULT_PULL_TIMEOUT_SECS
}
