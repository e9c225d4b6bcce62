//! Latency samples and the result of one benchmark phase

use crate::scenario::{OperationKind, Scenario};
use crate::stats::LatencyStats;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How a timed operation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleOutcome {
    /// Operation completed successfully
    Succeeded,
    /// Pull waited its full timeout without receiving a message
    TimedOut,
    /// Operation failed with a provider error
    Failed,
}

impl SampleOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

/// A single timed operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencySample {
    /// Zero-based index of the message within the phase
    pub iteration: u32,
    pub operation: OperationKind,
    pub outcome: SampleOutcome,
    /// Offset of the operation start from the phase start
    pub started_at: Duration,
    /// Time between operation start and completion
    pub latency: Duration,
}

impl LatencySample {
    /// Offset of the operation end from the phase start
    pub fn finished_at(&self) -> Duration {
        self.started_at + self.latency
    }
}

/// Samples recorded by one phase, in recording order
///
/// Built once when a phase completes or aborts; there is no way to change the
/// samples afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    scenario: Scenario,
    message_count: u32,
    message_size: usize,
    started_at: DateTime<Utc>,
    samples: Vec<LatencySample>,
}

impl BenchmarkResult {
    pub fn new(
        scenario: Scenario,
        message_count: u32,
        message_size: usize,
        started_at: DateTime<Utc>,
        samples: Vec<LatencySample>,
    ) -> Self {
        Self {
            scenario,
            message_count,
            message_size,
            started_at,
            samples,
        }
    }

    pub fn scenario(&self) -> Scenario {
        self.scenario
    }

    /// Number of messages the phase was asked to process
    pub fn message_count(&self) -> u32 {
        self.message_count
    }

    pub fn message_size(&self) -> usize {
        self.message_size
    }

    /// Wall-clock time the phase started
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn samples(&self) -> &[LatencySample] {
        &self.samples
    }

    /// Samples of one operation kind, in recording order
    pub fn samples_for(&self, operation: OperationKind) -> impl Iterator<Item = &LatencySample> {
        self.samples
            .iter()
            .filter(move |s| s.operation == operation)
    }

    /// Number of samples of `operation` that did not succeed
    pub fn unsuccessful_count(&self, operation: OperationKind) -> usize {
        self.samples_for(operation)
            .filter(|s| !s.outcome.is_success())
            .count()
    }

    /// Statistics over the successful samples of `operation`
    pub fn stats_for(&self, operation: OperationKind) -> LatencyStats {
        let latencies: Vec<Duration> = self
            .samples_for(operation)
            .filter(|s| s.outcome.is_success())
            .map(|s| s.latency)
            .collect();
        LatencyStats::from_latencies(&latencies)
    }

    /// Time from the phase start to the end of the last sample
    pub fn elapsed(&self) -> Duration {
        self.samples
            .iter()
            .map(LatencySample::finished_at)
            .max()
            .unwrap_or_default()
    }
}
