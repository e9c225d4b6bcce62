//! Messaging and benchmark errors
//!
//! `ClientError` covers failures of a single queue operation;
//! `BenchmarkError` is the terminal error of a phase and keeps the samples
//! recorded up to the failure.

use msgbench_common::{BenchmarkResult, OperationKind};
use thiserror::Error;

/// Boxed provider error
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure of a single queue operation or of backend construction
#[derive(Debug, Error)]
pub enum ClientError {
    /// The queue could not be resolved when the backend was constructed
    #[error("queue '{queue_name}' not found in {region}")]
    QueueNotFound { region: String, queue_name: String },

    /// Queue resolution failed for a reason other than absence
    #[error("failed to resolve queue '{queue_name}': {source}")]
    Resolve {
        queue_name: String,
        #[source]
        source: BoxError,
    },

    /// The provider rejected a publish
    #[error("publish failed: {0}")]
    Publish(#[source] BoxError),

    /// The provider failed a pull (distinct from "no message available")
    #[error("pull failed: {0}")]
    Pull(#[source] BoxError),

    /// The handle was invalid, expired or already acknowledged
    #[error("acknowledge failed: {0}")]
    Acknowledge(#[source] BoxError),
}

impl ClientError {
    pub fn is_queue_not_found(&self) -> bool {
        matches!(self, Self::QueueNotFound { .. })
    }

    /// Operation this error came from, if it came from one
    pub fn operation(&self) -> Option<OperationKind> {
        match self {
            Self::Publish(_) => Some(OperationKind::Publish),
            Self::Pull(_) => Some(OperationKind::Pull),
            Self::Acknowledge(_) => Some(OperationKind::Acknowledge),
            Self::QueueNotFound { .. } | Self::Resolve { .. } => None,
        }
    }
}

/// A phase stopped at its first untolerated failure
#[derive(Debug, Error)]
#[error("{operation} failed at iteration {iteration}: {source}")]
pub struct BenchmarkError {
    pub iteration: u32,
    pub operation: OperationKind,
    #[source]
    pub source: ClientError,
    partial: Box<BenchmarkResult>,
}

impl BenchmarkError {
    pub fn new(
        iteration: u32,
        operation: OperationKind,
        source: ClientError,
        partial: BenchmarkResult,
    ) -> Self {
        Self {
            iteration,
            operation,
            source,
            partial: Box::new(partial),
        }
    }

    /// Samples recorded before (and including) the failed operation
    pub fn partial(&self) -> &BenchmarkResult {
        &self.partial
    }

    pub fn into_partial(self) -> BenchmarkResult {
        *self.partial
    }
}
