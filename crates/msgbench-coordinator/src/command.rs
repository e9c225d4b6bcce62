//! External command execution with failure classification and retry
//!
//! A run counts as failed when the process exits non-zero, and also when it
//! exits zero but writes to stderr: the AWS CLI does not always report
//! errors through its exit code. A [`CommandSpec`] may carry a predicate that
//! turns a specific failure back into success.
//!
//! [`CommandRunner::run_retryable`] repeats a failing run under the runner's
//! [`RetryPolicy`]. Failures that a retry cannot fix (nothing to run, the
//! program cannot be spawned) are returned at once.

use crate::retry::RetryPolicy;
use backon::Retryable;
use std::fmt;
use std::future::Future;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

/// Output of one finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    /// Process exit code; -1 when the process was killed by a signal
    pub exit_code: i32,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Predicate that accepts a failed result as success
pub type SuppressFn = Arc<dyn Fn(&CommandResult) -> bool + Send + Sync>;

/// A command line plus how to run and judge it
#[derive(Clone)]
pub struct CommandSpec {
    args: Vec<String>,
    env: Vec<(String, String)>,
    suppress: Option<SuppressFn>,
}

impl CommandSpec {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            env: Vec::new(),
            suppress: None,
        }
    }

    /// Add or override one variable of the inherited environment
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Treat failed results matching `predicate` as success
    pub fn suppress_failure(
        mut self,
        predicate: impl Fn(&CommandResult) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.suppress = Some(Arc::new(predicate));
        self
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn env_overlay(&self) -> &[(String, String)] {
        &self.env
    }

    fn is_suppressed(&self, result: &CommandResult) -> bool {
        self.suppress.as_ref().is_some_and(|predicate| predicate(result))
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.args.join(" "))
    }
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("args", &self.args)
            .field("env", &self.env)
            .field("suppress_failure", &self.suppress.is_some())
            .finish()
    }
}

/// Why a finished process counts as failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    NonZeroExit(i32),
    /// Exit code 0, but the process wrote to stderr
    UnexpectedStderr,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonZeroExit(code) => write!(f, "exited with status {code}"),
            Self::UnexpectedStderr => f.write_str("exited with status 0 but wrote to stderr"),
        }
    }
}

/// A process that ran to completion and failed
#[derive(Debug, Clone, Error)]
#[error("`{command}` {reason}: {}", .result.stderr.trim())]
pub struct CommandFailure {
    pub command: String,
    pub reason: FailureReason,
    pub result: CommandResult,
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("empty command")]
    EmptyCommand,

    #[error("failed to spawn `{command}`")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed waiting for `{command}`")]
    Wait {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    #[error(transparent)]
    Failure(#[from] CommandFailure),

    #[error("`{command}` still failing after {attempts} attempts")]
    RetryBudgetExhausted {
        command: String,
        attempts: u32,
        #[source]
        last: Box<CommandError>,
    },
}

impl CommandError {
    /// Whether running the same command again may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Failure(_))
    }

    /// The failed process result behind this error, if any
    pub fn failure(&self) -> Option<&CommandFailure> {
        match self {
            Self::Failure(failure) => Some(failure),
            Self::RetryBudgetExhausted { last, .. } => last.failure(),
            _ => None,
        }
    }
}

/// Runs one attempt of a command
///
/// Implementations report how the process ended; judging the result is left
/// to [`CommandRunner`].
pub trait CommandExecutor: Send + Sync {
    fn execute(
        &self,
        spec: &CommandSpec,
    ) -> impl Future<Output = Result<CommandResult, CommandError>> + Send;
}

/// Spawns a real process per attempt
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    timeout: Duration,
}

impl ProcessExecutor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl CommandExecutor for ProcessExecutor {
    async fn execute(&self, spec: &CommandSpec) -> Result<CommandResult, CommandError> {
        let (program, args) = spec.args().split_first().ok_or(CommandError::EmptyCommand)?;

        let child = Command::new(program)
            .args(args)
            .envs(spec.env_overlay().iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| CommandError::Spawn {
                command: spec.to_string(),
                source,
            })?;

        // On timeout the child is dropped, which kills it
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                return Err(CommandError::Wait {
                    command: spec.to_string(),
                    source,
                });
            }
            Err(_) => {
                warn!(
                    command = %spec,
                    timeout_secs = self.timeout.as_secs_f64(),
                    "Command timed out, killing process"
                );
                return Err(CommandError::Timeout {
                    command: spec.to_string(),
                    timeout: self.timeout,
                });
            }
        };

        Ok(CommandResult {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }
}

/// Judge a finished process
fn classify(spec: &CommandSpec, result: CommandResult) -> Result<CommandResult, CommandError> {
    let reason = if result.exit_code != 0 {
        FailureReason::NonZeroExit(result.exit_code)
    } else if !result.stderr.is_empty() {
        FailureReason::UnexpectedStderr
    } else {
        return Ok(result);
    };

    if spec.is_suppressed(&result) {
        debug!(command = %spec, %reason, "Command failure suppressed");
        return Ok(result);
    }

    Err(CommandFailure {
        command: spec.to_string(),
        reason,
        result,
    }
    .into())
}

/// Runs commands once or under a retry budget
#[derive(Debug, Clone)]
pub struct CommandRunner<E = ProcessExecutor> {
    executor: E,
    retry: RetryPolicy,
}

impl CommandRunner<ProcessExecutor> {
    /// Runner that spawns real processes
    pub fn new(config: &crate::config::CommandConfig) -> Self {
        Self::with_executor(ProcessExecutor::new(config.timeout), config.retry.clone())
    }
}

impl<E: CommandExecutor> CommandRunner<E> {
    pub fn with_executor(executor: E, retry: RetryPolicy) -> Self {
        Self { executor, retry }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Run once
    pub async fn run(&self, spec: &CommandSpec) -> Result<CommandResult, CommandError> {
        debug!(command = %spec, "Running command");
        let result = self.executor.execute(spec).await?;
        classify(spec, result)
    }

    /// Run until success or until the retry budget is spent
    pub async fn run_retryable(&self, spec: &CommandSpec) -> Result<CommandResult, CommandError> {
        let attempts = AtomicU32::new(0);

        let outcome = (|| async {
            attempts.fetch_add(1, Ordering::Relaxed);
            self.run(spec).await
        })
        .retry(self.retry.backoff())
        .when(CommandError::is_retryable)
        .notify(|e, dur| {
            warn!(
                command = %spec,
                delay = ?dur,
                error = %e,
                "Command failed, retrying..."
            );
        })
        .await;

        match outcome {
            Err(e) if e.is_retryable() => Err(CommandError::RetryBudgetExhausted {
                command: spec.to_string(),
                attempts: attempts.load(Ordering::Relaxed),
                last: Box::new(e),
            }),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays a fixed list of attempt outcomes
    #[derive(Default)]
    struct ScriptedExecutor {
        script: Mutex<VecDeque<Result<CommandResult, CommandError>>>,
        calls: AtomicU32,
    }

    impl ScriptedExecutor {
        fn new(script: impl IntoIterator<Item = Result<CommandResult, CommandError>>) -> Self {
            Self {
                script: Mutex::new(script.into_iter().collect()),
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl CommandExecutor for ScriptedExecutor {
        async fn execute(&self, _spec: &CommandSpec) -> Result<CommandResult, CommandError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(exited(0, "")))
        }
    }

    fn exited(exit_code: i32, stderr: &str) -> CommandResult {
        CommandResult {
            stdout: "{}".to_string(),
            stderr: stderr.to_string(),
            exit_code,
        }
    }

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            min_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(40),
            factor: 2.0,
            jitter: false,
        }
    }

    fn runner(
        script: impl IntoIterator<Item = Result<CommandResult, CommandError>>,
        max_attempts: u32,
    ) -> CommandRunner<ScriptedExecutor> {
        CommandRunner::with_executor(ScriptedExecutor::new(script), policy(max_attempts))
    }

    fn spec() -> CommandSpec {
        CommandSpec::new(["aws", "sqs", "list-queues"])
    }

    #[tokio::test]
    async fn clean_exit_succeeds() {
        let runner = runner([Ok(exited(0, ""))], 1);
        let result = runner.run(&spec()).await.unwrap();
        assert_eq!(result.stdout, "{}");
        assert!(result.success());
    }

    #[tokio::test]
    async fn non_zero_exit_fails() {
        let runner = runner([Ok(exited(2, "bad flag\n"))], 1);
        let err = runner.run(&spec()).await.unwrap_err();

        let failure = err.failure().unwrap();
        assert_eq!(failure.reason, FailureReason::NonZeroExit(2));
        assert_eq!(failure.result.stderr, "bad flag\n");
        assert_eq!(
            err.to_string(),
            "`aws sqs list-queues` exited with status 2: bad flag"
        );
    }

    #[tokio::test]
    async fn stderr_on_clean_exit_fails() {
        let runner = runner([Ok(exited(0, "warning: deprecated"))], 1);
        let err = runner.run(&spec()).await.unwrap_err();
        assert_eq!(
            err.failure().map(|f| f.reason),
            Some(FailureReason::UnexpectedStderr)
        );
    }

    #[tokio::test]
    async fn matching_suppress_predicate_turns_failure_into_success() {
        let spec = spec().suppress_failure(|r| r.stderr.contains("deprecated"));
        let runner = runner([Ok(exited(0, "warning: deprecated"))], 1);
        let result = runner.run(&spec).await.unwrap();
        assert_eq!(result.stderr, "warning: deprecated");

        let runner = self::runner([Ok(exited(254, "AccessDenied"))], 1);
        assert!(runner.run(&spec).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn retryable_run_succeeds_after_transient_failures() {
        let runner = runner([Ok(exited(1, "throttled")), Ok(exited(0, "flaky"))], 5);
        let result = runner.run_retryable(&spec()).await.unwrap();
        assert!(result.stderr.is_empty());
        assert_eq!(runner.executor().calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn retryable_run_stops_at_the_budget() {
        let script = (0..10).map(|_| Ok(exited(255, "throttled")));
        let runner = runner(script, 4);
        let err = runner.run_retryable(&spec()).await.unwrap_err();

        match &err {
            CommandError::RetryBudgetExhausted { attempts, last, .. } => {
                assert_eq!(*attempts, 4);
                assert!(matches!(**last, CommandError::Failure(_)));
            }
            other => panic!("expected RetryBudgetExhausted, got {other:?}"),
        }
        assert_eq!(runner.executor().calls(), 4);
        assert_eq!(
            err.failure().map(|f| f.reason),
            Some(FailureReason::NonZeroExit(255))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn timeouts_are_retried() {
        let timeout = CommandError::Timeout {
            command: "aws".to_string(),
            timeout: Duration::from_secs(1),
        };
        let runner = runner([Err(timeout)], 3);
        runner.run_retryable(&spec()).await.unwrap();
        assert_eq!(runner.executor().calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn spawn_errors_are_not_retried() {
        let spawn = CommandError::Spawn {
            command: "aws".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        let runner = runner([Err(spawn)], 5);
        let err = runner.run_retryable(&spec()).await.unwrap_err();
        assert!(matches!(err, CommandError::Spawn { .. }));
        assert_eq!(runner.executor().calls(), 1);
    }

    #[tokio::test]
    async fn single_attempt_budget_still_reports_exhaustion() {
        let runner = runner([Ok(exited(1, ""))], 1);
        let err = runner.run_retryable(&spec()).await.unwrap_err();
        assert!(matches!(
            err,
            CommandError::RetryBudgetExhausted { attempts: 1, .. }
        ));
    }

    #[test]
    fn spec_debug_hides_predicate() {
        let spec = CommandSpec::new(["aws", "sts", "get-caller-identity"])
            .env("AWS_PROFILE", "bench")
            .suppress_failure(|_| true);
        let debug = format!("{spec:?}");
        assert!(debug.contains("AWS_PROFILE"));
        assert!(debug.contains("suppress_failure: true"));
        assert_eq!(spec.to_string(), "aws sts get-caller-identity");
    }
}
