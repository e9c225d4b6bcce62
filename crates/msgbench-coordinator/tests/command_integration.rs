//! CommandRunner against real processes

use msgbench_coordinator::{
    CommandError, CommandRunner, CommandSpec, FailureReason, ProcessExecutor, RetryPolicy,
};
use std::time::Duration;

fn quick_retries(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        min_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(20),
        factor: 2.0,
        jitter: false,
    }
}

fn runner(max_attempts: u32) -> CommandRunner {
    CommandRunner::with_executor(
        ProcessExecutor::new(Duration::from_secs(10)),
        quick_retries(max_attempts),
    )
}

fn sh(script: &str) -> CommandSpec {
    CommandSpec::new(["sh", "-c", script])
}

#[tokio::test]
async fn captures_stdout_and_exit_code() {
    let result = runner(1).run(&sh("echo hello")).await.unwrap();
    assert_eq!(result.stdout, "hello\n");
    assert_eq!(result.stderr, "");
    assert_eq!(result.exit_code, 0);
}

#[tokio::test]
async fn non_zero_exit_is_a_failure() {
    let err = runner(1).run(&sh("echo oops >&2; exit 3")).await.unwrap_err();
    let failure = err.failure().unwrap();
    assert_eq!(failure.reason, FailureReason::NonZeroExit(3));
    assert_eq!(failure.result.stderr, "oops\n");
}

#[tokio::test]
async fn stderr_with_zero_exit_is_a_failure_unless_suppressed() {
    let script = "echo '{}'; echo 'warning: old cli' >&2";

    let err = runner(1).run(&sh(script)).await.unwrap_err();
    assert_eq!(
        err.failure().map(|f| f.reason),
        Some(FailureReason::UnexpectedStderr)
    );

    let spec = sh(script).suppress_failure(|r| r.stderr.starts_with("warning:"));
    let result = runner(1).run(&spec).await.unwrap();
    assert_eq!(result.stdout, "{}\n");
}

#[tokio::test]
async fn environment_overlay_adds_to_inherited_environment() {
    let spec = sh("printf '%s:%s' \"$MSGBENCH_TEST_VAR\" \"${PATH:+has-path}\"")
        .env("MSGBENCH_TEST_VAR", "overlay");
    let result = runner(1).run(&spec).await.unwrap();
    assert_eq!(result.stdout, "overlay:has-path");
}

#[tokio::test]
async fn missing_program_fails_without_retry() {
    let spec = CommandSpec::new(["msgbench-no-such-program-xyz"]);
    let err = runner(5).run_retryable(&spec).await.unwrap_err();
    assert!(matches!(err, CommandError::Spawn { .. }));
}

#[tokio::test]
async fn empty_command_is_rejected() {
    let spec = CommandSpec::new(Vec::<String>::new());
    let err = runner(5).run_retryable(&spec).await.unwrap_err();
    assert!(matches!(err, CommandError::EmptyCommand));
}

#[tokio::test]
async fn slow_process_times_out_and_is_killed() {
    let runner = CommandRunner::with_executor(
        ProcessExecutor::new(Duration::from_millis(200)),
        quick_retries(2),
    );
    let err = runner.run_retryable(&sh("sleep 30")).await.unwrap_err();
    match err {
        CommandError::RetryBudgetExhausted { attempts, last, .. } => {
            assert_eq!(attempts, 2);
            assert!(matches!(*last, CommandError::Timeout { .. }));
        }
        other => panic!("expected RetryBudgetExhausted, got {other:?}"),
    }
}

#[tokio::test]
async fn flaky_command_succeeds_within_budget() {
    let dir = tempfile::tempdir().unwrap();
    let counter = dir.path().join("attempts");
    // Fails on the first two runs, succeeds on the third
    let script = format!(
        "n=$(cat '{path}' 2>/dev/null || echo 0); n=$((n + 1)); echo $n > '{path}'; \
         [ $n -ge 3 ] || exit 1; echo done",
        path = counter.display()
    );

    let result = runner(5).run_retryable(&sh(&script)).await.unwrap();
    assert_eq!(result.stdout, "done\n");
    assert_eq!(std::fs::read_to_string(&counter).unwrap().trim(), "3");
}

#[tokio::test]
async fn failing_command_never_exceeds_the_budget() {
    let dir = tempfile::tempdir().unwrap();
    let counter = dir.path().join("attempts");
    let script = format!(
        "n=$(cat '{path}' 2>/dev/null || echo 0); echo $((n + 1)) > '{path}'; exit 7",
        path = counter.display()
    );

    let err = runner(3).run_retryable(&sh(&script)).await.unwrap_err();
    assert!(matches!(
        err,
        CommandError::RetryBudgetExhausted { attempts: 3, .. }
    ));
    assert_eq!(std::fs::read_to_string(&counter).unwrap().trim(), "3");
}
