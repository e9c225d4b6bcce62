//! msgbench-coordinator - Provisioning for messaging benchmarks
//!
//! Runs the `aws` CLI with failure classification and a bounded retry
//! budget to discover zones, tag resources and manage queues.

pub mod aws;
pub mod command;
pub mod config;
pub mod retry;

pub use command::{
    CommandError, CommandExecutor, CommandFailure, CommandResult, CommandRunner, CommandSpec,
    FailureReason, ProcessExecutor,
};
pub use config::CommandConfig;
pub use retry::RetryPolicy;
