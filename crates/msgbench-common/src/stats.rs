//! Latency statistics utility
//!
//! Provides `LatencyStats` for computing min/avg/max and percentile
//! statistics from a collection of latency measurements.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Statistics for a collection of latency measurements, in milliseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencyStats {
    pub min_ms: f64,
    pub max_ms: f64,
    pub avg_ms: f64,
    pub p50_ms: f64,
    pub p90_ms: f64,
    pub p99_ms: f64,
    pub p999_ms: f64,
    /// Number of measurements
    pub count: usize,
}

impl LatencyStats {
    /// Compute statistics from a slice of latencies.
    ///
    /// Percentiles use the nearest-rank method over the sorted values.
    ///
    /// # Example
    /// ```
    /// use msgbench_common::stats::LatencyStats;
    /// use std::time::Duration;
    ///
    /// let latencies: Vec<Duration> = (1..=5).map(Duration::from_millis).collect();
    /// let stats = LatencyStats::from_latencies(&latencies);
    /// assert_eq!(stats.min_ms, 1.0);
    /// assert_eq!(stats.max_ms, 5.0);
    /// assert_eq!(stats.avg_ms, 3.0);
    /// assert_eq!(stats.p50_ms, 3.0);
    /// assert_eq!(stats.count, 5);
    /// ```
    pub fn from_latencies(latencies: &[Duration]) -> Self {
        if latencies.is_empty() {
            return Self::default();
        }

        let mut sorted: Vec<f64> = latencies.iter().copied().map(duration_ms).collect();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let count = sorted.len();
        let sum: f64 = sorted.iter().sum();

        Self {
            min_ms: sorted[0],
            max_ms: sorted[count - 1],
            avg_ms: sum / count as f64,
            p50_ms: percentile(&sorted, 50.0),
            p90_ms: percentile(&sorted, 90.0),
            p99_ms: percentile(&sorted, 99.0),
            p999_ms: percentile(&sorted, 99.9),
            count,
        }
    }

    /// Check if no measurements were provided
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Convert a duration to fractional milliseconds
pub fn duration_ms(d: Duration) -> f64 {
    d.as_nanos() as f64 / 1_000_000.0
}

/// Nearest-rank percentile of an ascending, non-empty slice
fn percentile(sorted: &[f64], pct: f64) -> f64 {
    let rank = ((pct / 100.0) * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}
