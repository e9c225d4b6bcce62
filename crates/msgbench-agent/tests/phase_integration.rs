//! End-to-end phases against the in-memory backend

use msgbench_agent::results::{OutputFormat, render};
use msgbench_agent::{
    BenchmarkRunner, InMemoryBroker, Message, MessagingClient, PhaseRequest, RunnerState,
    run_configured,
};
use msgbench_common::{BenchmarkConfig, OperationKind, PhaseReport, Provider, Scenario};
use std::io::Write;
use std::time::Duration;

fn memory_config(scenario: Scenario, message_count: u32) -> BenchmarkConfig {
    BenchmarkConfig {
        provider: Provider::Memory,
        region: "local".to_string(),
        queue_name: "bench".to_string(),
        scenario,
        message_count,
        message_size: 64,
        pull_timeout_secs: 1,
    }
}

#[tokio::test]
async fn publish_then_pull_drains_the_queue() {
    let broker = InMemoryBroker::new();
    broker.create_queue("bench");
    let queue = broker.connect("local", "bench").unwrap();
    let mut runner = BenchmarkRunner::new(queue.clone(), Duration::from_secs(1));

    let publish = PhaseRequest::new(Scenario::Publish, 20, 128).unwrap();
    let published = runner.run_phase(&publish).await.unwrap();
    assert_eq!(published.samples().len(), 20);
    assert_eq!(queue.ready_len(), 20);

    let pull = PhaseRequest::new(Scenario::Pull, 20, 128).unwrap();
    let pulled = runner.run_phase(&pull).await.unwrap();
    assert_eq!(pulled.samples_for(OperationKind::Pull).count(), 20);
    assert_eq!(pulled.samples_for(OperationKind::Acknowledge).count(), 20);
    assert_eq!(pulled.unsuccessful_count(OperationKind::Pull), 0);
    assert_eq!(queue.ready_len(), 0);
    assert_eq!(queue.in_flight_len(), 0);
    assert!(matches!(runner.state(), RunnerState::Completed(_)));
}

#[tokio::test]
async fn round_trip_report_covers_all_operations() {
    let queue = InMemoryBroker::new().create_queue("bench");
    let report = run_configured(queue, &memory_config(Scenario::RoundTrip, 10))
        .await
        .unwrap();

    assert!(report.aborted.is_none());
    assert_eq!(report.operations.len(), 3);
    for summary in report.operations.values() {
        assert_eq!(summary.samples, 10);
        assert_eq!(summary.unsuccessful, 0);
        assert_eq!(summary.success_ratio, 1.0);
        assert_eq!(summary.latency.count, 10);
    }

    let json = render(&report, OutputFormat::Json).unwrap();
    let parsed: PhaseReport = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.scenario, Scenario::RoundTrip);
    assert_eq!(parsed.operations.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn pull_phase_on_partly_filled_queue_reports_timeouts() {
    let queue = InMemoryBroker::new().create_queue("bench");
    for _ in 0..2 {
        queue.publish(&Message::random(8)).await.unwrap();
    }

    let report = run_configured(queue, &memory_config(Scenario::Pull, 5))
        .await
        .unwrap();

    let pull = &report.operations[&OperationKind::Pull];
    assert_eq!(pull.samples, 5);
    assert_eq!(pull.unsuccessful, 3);
    assert_eq!(report.operations[&OperationKind::Acknowledge].samples, 2);
    assert!(report.aborted.is_none());
}

#[tokio::test]
async fn config_file_drives_a_phase() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"provider": "memory", "region": "local", "queue_name": "bench",
            "scenario": "publish_latency", "message_count": 4}}"#
    )
    .unwrap();

    let config = BenchmarkConfig::load(file.path()).unwrap();
    assert_eq!(config.scenario, Scenario::Publish);

    let queue = InMemoryBroker::new().create_queue(&config.queue_name);
    let report = run_configured(queue.clone(), &config).await.unwrap();
    assert_eq!(report.operations[&OperationKind::Publish].samples, 4);
    assert_eq!(queue.ready_len(), 4);
}
