//! msgbench-agent: times publish / pull / acknowledge against a queue
//!
//! Logs go to stderr; stdout carries only the report.

use anyhow::{Context, Result};
use clap::Parser;
use msgbench_agent::results::{self, OutputFormat};
use msgbench_agent::{InMemoryBroker, InMemoryQueue, Message, MessagingClient, SqsClient};
use msgbench_common::defaults::{
    DEFAULT_MESSAGE_COUNT, DEFAULT_MESSAGE_SIZE, DEFAULT_PULL_TIMEOUT_SECS, DEFAULT_QUEUE_NAME,
    DEFAULT_REGION,
};
use msgbench_common::{BenchmarkConfig, PhaseReport, Provider, Scenario};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "msgbench-agent")]
#[command(about = "Measure messaging-queue publish/pull/acknowledge latency")]
#[command(version)]
struct Args {
    /// Load the benchmark configuration from a JSON file
    #[arg(long, conflicts_with_all = [
        "provider", "region", "queue_name", "scenario",
        "message_count", "message_size", "pull_timeout_secs",
    ])]
    config: Option<PathBuf>,

    /// Messaging backend (sqs, memory)
    #[arg(long, default_value = "sqs")]
    provider: Provider,

    /// Region the queue lives in
    #[arg(long, default_value = DEFAULT_REGION)]
    region: String,

    /// Name of an existing queue
    #[arg(long, default_value = DEFAULT_QUEUE_NAME)]
    queue_name: String,

    /// Scenario to run (publish, pull, round-trip)
    #[arg(long, required_unless_present = "config")]
    scenario: Option<Scenario>,

    /// Number of messages to process
    #[arg(long, default_value_t = DEFAULT_MESSAGE_COUNT)]
    message_count: u32,

    /// Payload size in bytes
    #[arg(long, default_value_t = DEFAULT_MESSAGE_SIZE)]
    message_size: usize,

    /// Seconds a single pull waits for a message
    #[arg(long, default_value_t = DEFAULT_PULL_TIMEOUT_SECS)]
    pull_timeout_secs: u64,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

impl Args {
    /// Build the validated configuration from the file or the flags
    fn benchmark_config(&self) -> Result<BenchmarkConfig> {
        let config = match &self.config {
            Some(path) => BenchmarkConfig::load(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => {
                let scenario = self
                    .scenario
                    .context("--scenario is required without --config")?;
                let config = BenchmarkConfig {
                    provider: self.provider,
                    region: self.region.clone(),
                    queue_name: self.queue_name.clone(),
                    scenario,
                    message_count: self.message_count,
                    message_size: self.message_size,
                    pull_timeout_secs: self.pull_timeout_secs,
                };
                config.validate_all().context("Invalid benchmark configuration")?;
                config
            }
        };
        Ok(config)
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = args.benchmark_config()?;
    info!(
        provider = %config.provider,
        region = %config.region,
        queue_name = %config.queue_name,
        scenario = %config.scenario,
        message_count = config.message_count,
        message_size = config.message_size,
        "Starting msgbench-agent"
    );

    let report = match config.provider {
        Provider::Sqs => {
            let client = SqsClient::connect(&config.region, &config.queue_name)
                .await
                .context("Failed to connect to SQS queue")?;
            run_phase(client, &config).await?
        }
        Provider::Memory => {
            let broker = InMemoryBroker::new();
            broker.create_queue(&config.queue_name);
            let queue = broker.connect(&config.region, &config.queue_name)?;
            if config.scenario == Scenario::Pull {
                seed(&queue, config.message_count, config.message_size).await?;
            }
            run_phase(queue, &config).await?
        }
    };

    println!("{}", results::render(&report, args.format)?);

    if let Some(reason) = &report.aborted {
        anyhow::bail!("Benchmark phase aborted: {reason}");
    }
    Ok(())
}

async fn run_phase<C: MessagingClient>(client: C, config: &BenchmarkConfig) -> Result<PhaseReport> {
    msgbench_agent::run_configured(client, config)
        .await
        .context("Failed to start benchmark phase")
}

/// A fresh in-memory queue is empty; give a pull phase something to receive
async fn seed(queue: &InMemoryQueue, count: u32, size: usize) -> Result<()> {
    info!(count, size, "Seeding in-memory queue");
    for _ in 0..count {
        queue
            .publish(&Message::random(size))
            .await
            .context("Failed to seed in-memory queue")?;
    }
    Ok(())
}

/// Print error in a user-friendly way
fn print_error(e: &anyhow::Error) {
    use std::io::Write;

    let mut stderr = std::io::stderr();

    let _ = writeln!(stderr, "\n\x1b[1;31mError:\x1b[0m {e}");

    let mut source = e.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  \x1b[33mCaused by:\x1b[0m {cause}");
        source = cause.source();
    }
}
