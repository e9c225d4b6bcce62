//! msgbench-agent - Messaging-queue benchmark client
//!
//! Times publish, pull and acknowledge operations against a queue backend
//! and reports per-operation latency.

pub mod benchmark;
pub mod client;
pub mod error;
pub mod memory;
pub mod results;
pub mod sqs;

pub use benchmark::{BenchmarkRunner, PhaseRequest, RunnerState, run_configured};
pub use client::{AckHandle, Message, MessagingClient, PublishReceipt, PulledMessage};
pub use error::{BenchmarkError, ClientError};
pub use memory::{InMemoryBroker, InMemoryQueue};
pub use sqs::SqsClient;
