//! Serializable summary of a benchmark phase
//!
//! This is what the agent prints for the harness to collect: per-operation
//! latency statistics plus sample and failure counts.

use crate::result::BenchmarkResult;
use crate::scenario::{OperationKind, Scenario};
use crate::stats::{LatencyStats, duration_ms};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Summary of one operation kind within a phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationSummary {
    /// Samples recorded, successful or not
    pub samples: usize,
    /// Samples that timed out or failed
    pub unsuccessful: usize,
    /// Fraction of samples that succeeded (0.0 - 1.0)
    pub success_ratio: f64,
    /// Statistics over the successful samples
    pub latency: LatencyStats,
}

/// Summary of a whole phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseReport {
    pub scenario: Scenario,
    pub message_count: u32,
    pub message_size: usize,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: f64,
    /// Set when the phase stopped early
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aborted: Option<String>,
    pub operations: BTreeMap<OperationKind, OperationSummary>,
}

impl PhaseReport {
    /// Summarize a completed phase
    pub fn from_result(result: &BenchmarkResult) -> Self {
        let operations = result
            .scenario()
            .operations()
            .iter()
            .map(|&op| {
                let samples = result.samples_for(op).count();
                let unsuccessful = result.unsuccessful_count(op);
                let success_ratio = if samples == 0 {
                    0.0
                } else {
                    (samples - unsuccessful) as f64 / samples as f64
                };
                (
                    op,
                    OperationSummary {
                        samples,
                        unsuccessful,
                        success_ratio,
                        latency: result.stats_for(op),
                    },
                )
            })
            .collect();

        Self {
            scenario: result.scenario(),
            message_count: result.message_count(),
            message_size: result.message_size(),
            started_at: result.started_at(),
            elapsed_ms: duration_ms(result.elapsed()),
            aborted: None,
            operations,
        }
    }

    /// Summarize a phase that stopped at `reason`
    pub fn aborted(result: &BenchmarkResult, reason: impl Into<String>) -> Self {
        Self {
            aborted: Some(reason.into()),
            ..Self::from_result(result)
        }
    }

    /// Messages per second over the phase, based on `operation` successes
    pub fn throughput(&self, operation: OperationKind) -> f64 {
        let Some(summary) = self.operations.get(&operation) else {
            return 0.0;
        };
        if self.elapsed_ms <= 0.0 {
            return 0.0;
        }
        (summary.samples - summary.unsuccessful) as f64 / (self.elapsed_ms / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::{LatencySample, SampleOutcome};
    use std::time::Duration;

    fn pull_sample(iteration: u32, outcome: SampleOutcome) -> LatencySample {
        LatencySample {
            iteration,
            operation: OperationKind::Pull,
            outcome,
            started_at: Duration::from_millis(u64::from(iteration) * 250),
            latency: Duration::from_millis(250),
        }
    }

    #[test]
    fn summarizes_each_scenario_operation() {
        let result = BenchmarkResult::new(
            Scenario::Pull,
            4,
            8,
            Utc::now(),
            vec![
                pull_sample(0, SampleOutcome::Succeeded),
                pull_sample(1, SampleOutcome::TimedOut),
                pull_sample(2, SampleOutcome::Succeeded),
                pull_sample(3, SampleOutcome::TimedOut),
            ],
        );
        let report = PhaseReport::from_result(&result);

        let pull = &report.operations[&OperationKind::Pull];
        assert_eq!(pull.samples, 4);
        assert_eq!(pull.unsuccessful, 2);
        assert_eq!(pull.success_ratio, 0.5);
        assert_eq!(pull.latency.count, 2);

        let ack = &report.operations[&OperationKind::Acknowledge];
        assert_eq!(ack.samples, 0);
        assert_eq!(ack.success_ratio, 0.0);

        assert_eq!(report.elapsed_ms, 1000.0);
        assert_eq!(report.throughput(OperationKind::Pull), 2.0);
        assert_eq!(report.throughput(OperationKind::Publish), 0.0);
    }

    #[test]
    fn aborted_report_keeps_reason() {
        let result = BenchmarkResult::new(Scenario::Publish, 10, 8, Utc::now(), Vec::new());
        let report = PhaseReport::aborted(&result, "publish rejected");
        assert_eq!(report.aborted.as_deref(), Some("publish rejected"));

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"aborted\":\"publish rejected\""));
        assert!(json.contains("\"publish\""));
    }
}
