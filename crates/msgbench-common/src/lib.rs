//! msgbench-common - Shared types and utilities
//!
//! This crate provides the types used by both the agent and coordinator,
//! without any AWS SDK dependencies to keep it lightweight.
//!
//! ## Modules
//!
//! - [`config`]: Benchmark configuration and backend selection
//! - [`defaults`]: Default configuration values
//! - [`error`]: Configuration and zone naming errors
//! - [`report`]: Serializable per-phase summary
//! - [`result`]: Latency samples and phase results
//! - [`scenario`]: Benchmark scenarios and operation kinds
//! - [`stats`]: Latency statistics (min/avg/max/percentiles)
//! - [`tags`]: AWS resource tags and CLI argument formatting
//! - [`zone`]: Region and availability-zone name handling

pub mod config;
pub mod defaults;
pub mod error;
pub mod report;
pub mod result;
pub mod scenario;
pub mod stats;
pub mod tags;
pub mod zone;

// Re-export commonly used types
pub use config::{BenchmarkConfig, Provider};
pub use error::{ConfigError, ZoneError};
pub use report::{OperationSummary, PhaseReport};
pub use result::{BenchmarkResult, LatencySample, SampleOutcome};
pub use scenario::{OperationKind, Scenario};
pub use stats::LatencyStats;
