//! Timed publish / pull / acknowledge cycles
//!
//! A [`BenchmarkRunner`] owns one [`MessagingClient`] and runs phases against
//! it. Each phase generates its messages up front, then processes them one at
//! a time; every operation that completes is recorded as a [`LatencySample`].
//! The first provider error stops the phase and is returned together with the
//! samples recorded so far.
//!
//! A round trip follows the message it published: messages that were already
//! in the queue are acknowledged untimed and skipped, and the pull sample
//! covers the wait until the published message arrives.

use crate::client::{Message, MessagingClient, PulledMessage};
use crate::error::{BenchmarkError, ClientError};
use chrono::Utc;
use msgbench_common::{
    BenchmarkConfig, BenchmarkResult, ConfigError, LatencySample, OperationKind, PhaseReport,
    SampleOutcome, Scenario,
};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Parameters of one benchmark phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseRequest {
    scenario: Scenario,
    message_count: u32,
    message_size: usize,
}

impl PhaseRequest {
    pub fn new(
        scenario: Scenario,
        message_count: u32,
        message_size: usize,
    ) -> Result<Self, ConfigError> {
        if message_count == 0 {
            return Err(ConfigError::InvalidMessageCount(message_count));
        }
        Ok(Self {
            scenario,
            message_count,
            message_size,
        })
    }

    pub fn from_config(config: &BenchmarkConfig) -> Result<Self, ConfigError> {
        Self::new(config.scenario, config.message_count, config.message_size)
    }

    pub fn scenario(&self) -> Scenario {
        self.scenario
    }

    pub fn message_count(&self) -> u32 {
        self.message_count
    }

    pub fn message_size(&self) -> usize {
        self.message_size
    }
}

/// Outcome of the most recent phase
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RunnerState {
    #[default]
    Idle,
    Completed(BenchmarkResult),
    /// Stopped at the first failure; holds the partial result
    Aborted(BenchmarkResult),
}

/// Failed operation inside a phase, before it is tied to the partial result
struct StepFailure {
    operation: OperationKind,
    source: ClientError,
}

/// Collects samples relative to the phase start
struct SampleRecorder {
    origin: Instant,
    samples: Vec<LatencySample>,
}

impl SampleRecorder {
    fn new(capacity: usize) -> Self {
        Self {
            origin: Instant::now(),
            samples: Vec::with_capacity(capacity),
        }
    }

    /// Time `operation`, record it, and pass its result through
    async fn record<T, F>(
        &mut self,
        iteration: u32,
        operation: OperationKind,
        fut: F,
        classify: fn(&T) -> SampleOutcome,
    ) -> Result<T, StepFailure>
    where
        F: Future<Output = Result<T, ClientError>>,
    {
        let start = Instant::now();
        let result = fut.await;
        let latency = start.elapsed();

        let outcome = match &result {
            Ok(value) => classify(value),
            Err(_) => SampleOutcome::Failed,
        };
        self.samples.push(LatencySample {
            iteration,
            operation,
            outcome,
            started_at: start.duration_since(self.origin),
            latency,
        });

        result.map_err(|source| StepFailure { operation, source })
    }
}

fn succeeded<T>(_: &T) -> SampleOutcome {
    SampleOutcome::Succeeded
}

fn pull_outcome(pulled: &Option<PulledMessage>) -> SampleOutcome {
    match pulled {
        Some(_) => SampleOutcome::Succeeded,
        None => SampleOutcome::TimedOut,
    }
}

/// Runs benchmark phases against a single messaging backend
#[derive(Debug)]
pub struct BenchmarkRunner<C> {
    client: C,
    pull_timeout: Duration,
    state: RunnerState,
}

impl<C: MessagingClient> BenchmarkRunner<C> {
    pub fn new(client: C, pull_timeout: Duration) -> Self {
        Self {
            client,
            pull_timeout,
            state: RunnerState::Idle,
        }
    }

    pub fn state(&self) -> &RunnerState {
        &self.state
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn pull_timeout(&self) -> Duration {
        self.pull_timeout
    }

    /// Run one phase to completion or to its first failure
    ///
    /// The runner's state reflects the outcome of the latest phase.
    pub async fn run_phase(
        &mut self,
        request: &PhaseRequest,
    ) -> Result<BenchmarkResult, BenchmarkError> {
        let scenario = request.scenario;
        info!(
            %scenario,
            message_count = request.message_count,
            message_size = request.message_size,
            pull_timeout = ?self.pull_timeout,
            "Starting benchmark phase"
        );

        let messages: Vec<Message> = (0..request.message_count)
            .map(|_| Message::random(request.message_size))
            .collect();

        let started_at = Utc::now();
        let per_iteration = scenario.operations().len();
        let mut recorder = SampleRecorder::new(messages.len() * per_iteration);

        for (iteration, message) in (0u32..).zip(&messages) {
            let outcome = self
                .run_iteration(&mut recorder, scenario, iteration, message)
                .await;
            if let Err(failure) = outcome {
                let partial = BenchmarkResult::new(
                    scenario,
                    request.message_count,
                    request.message_size,
                    started_at,
                    recorder.samples,
                );
                warn!(
                    %scenario,
                    iteration,
                    operation = %failure.operation,
                    error = %failure.source,
                    "Benchmark phase aborted"
                );
                self.state = RunnerState::Aborted(partial.clone());
                return Err(BenchmarkError::new(
                    iteration,
                    failure.operation,
                    failure.source,
                    partial,
                ));
            }
        }

        let result = BenchmarkResult::new(
            scenario,
            request.message_count,
            request.message_size,
            started_at,
            recorder.samples,
        );
        info!(
            %scenario,
            samples = result.samples().len(),
            elapsed = ?result.elapsed(),
            "Benchmark phase complete"
        );
        self.state = RunnerState::Completed(result.clone());
        Ok(result)
    }

    async fn run_iteration(
        &self,
        recorder: &mut SampleRecorder,
        scenario: Scenario,
        iteration: u32,
        message: &Message,
    ) -> Result<(), StepFailure> {
        match scenario {
            Scenario::Publish => {
                self.publish(recorder, iteration, message).await?;
            }
            Scenario::Pull => {
                self.pull_and_acknowledge(recorder, iteration).await?;
            }
            Scenario::RoundTrip => {
                let message_id = self.publish(recorder, iteration, message).await?;
                self.round_trip_pull(recorder, iteration, &message_id).await?;
            }
        }
        Ok(())
    }

    async fn publish(
        &self,
        recorder: &mut SampleRecorder,
        iteration: u32,
        message: &Message,
    ) -> Result<String, StepFailure> {
        let receipt = recorder
            .record(
                iteration,
                OperationKind::Publish,
                self.client.publish(message),
                succeeded,
            )
            .await?;
        debug!(iteration, message_id = %receipt.message_id, "Published");
        Ok(receipt.message_id)
    }

    async fn pull_and_acknowledge(
        &self,
        recorder: &mut SampleRecorder,
        iteration: u32,
    ) -> Result<(), StepFailure> {
        let pulled = recorder
            .record(
                iteration,
                OperationKind::Pull,
                self.client.pull(self.pull_timeout),
                pull_outcome,
            )
            .await?;

        self.acknowledge(recorder, iteration, pulled).await
    }

    async fn round_trip_pull(
        &self,
        recorder: &mut SampleRecorder,
        iteration: u32,
        message_id: &str,
    ) -> Result<(), StepFailure> {
        let pulled = recorder
            .record(
                iteration,
                OperationKind::Pull,
                self.pull_message(message_id),
                pull_outcome,
            )
            .await?;

        self.acknowledge(recorder, iteration, pulled).await
    }

    /// Pull until `message_id` arrives or the pull timeout runs out
    async fn pull_message(&self, message_id: &str) -> Result<Option<PulledMessage>, ClientError> {
        let deadline = Instant::now().checked_add(self.pull_timeout);
        loop {
            let remaining = match deadline {
                Some(deadline) => deadline.saturating_duration_since(Instant::now()),
                None => self.pull_timeout,
            };
            if remaining.is_zero() {
                return Ok(None);
            }
            let Some(pulled) = self.client.pull(remaining).await? else {
                return Ok(None);
            };
            if pulled.message_id == message_id {
                return Ok(Some(pulled));
            }
            debug!(
                expected = message_id,
                message_id = %pulled.message_id,
                "Skipping message from an earlier publish"
            );
            self.client.acknowledge(pulled.handle).await?;
        }
    }

    async fn acknowledge(
        &self,
        recorder: &mut SampleRecorder,
        iteration: u32,
        pulled: Option<PulledMessage>,
    ) -> Result<(), StepFailure> {
        let Some(pulled) = pulled else {
            debug!(iteration, timeout = ?self.pull_timeout, "Pull returned no message");
            return Ok(());
        };

        recorder
            .record(
                iteration,
                OperationKind::Acknowledge,
                self.client.acknowledge(pulled.handle),
                succeeded,
            )
            .await?;
        debug!(iteration, message_id = %pulled.message_id, "Acknowledged");
        Ok(())
    }
}

/// Run the phase described by `config` and summarize it
///
/// An aborted phase still produces a report, marked with the failure.
pub async fn run_configured<C: MessagingClient>(
    client: C,
    config: &BenchmarkConfig,
) -> Result<PhaseReport, ConfigError> {
    let request = PhaseRequest::from_config(config)?;
    let mut runner = BenchmarkRunner::new(client, config.pull_timeout());
    let report = match runner.run_phase(&request).await {
        Ok(result) => PhaseReport::from_result(&result),
        Err(e) => PhaseReport::aborted(e.partial(), e.to_string()),
    };
    Ok(report)
}
