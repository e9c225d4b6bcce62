//! Benchmark scenarios and the operation kinds they time
//!
//! `Scenario` selects the operation sequence a phase runs for each message;
//! `OperationKind` tags every recorded latency sample.

use serde::{Deserialize, Serialize};

/// Operation sequence exercised by a benchmark phase
///
/// Parsing is case-insensitive and also accepts the legacy scenario names
/// (`publish_latency`, `pull_latency`, `end_to_end_latency`).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum Scenario {
    /// Publish only
    #[strum(to_string = "publish", serialize = "publish_latency")]
    #[serde(alias = "publish_latency")]
    Publish,
    /// Pull, then acknowledge whatever was received
    #[strum(to_string = "pull", serialize = "pull_latency")]
    #[serde(alias = "pull_latency")]
    Pull,
    /// Publish, pull and acknowledge the same logical message
    #[strum(
        to_string = "round-trip",
        serialize = "roundtrip",
        serialize = "end_to_end_latency"
    )]
    #[serde(alias = "roundtrip", alias = "end_to_end_latency")]
    RoundTrip,
}

impl Scenario {
    /// Operations timed by this scenario, in execution order
    pub fn operations(self) -> &'static [OperationKind] {
        match self {
            Self::Publish => &[OperationKind::Publish],
            Self::Pull => &[OperationKind::Pull, OperationKind::Acknowledge],
            Self::RoundTrip => &[
                OperationKind::Publish,
                OperationKind::Pull,
                OperationKind::Acknowledge,
            ],
        }
    }

    /// Parse from string, returning None for unknown values
    pub fn parse(s: &str) -> Option<Self> {
        s.parse().ok()
    }
}

/// Kind of a single timed operation
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OperationKind {
    Publish,
    Pull,
    Acknowledge,
}
