//! msgbench-coordinator: AWS provisioning for messaging benchmarks
//!
//! Discovers zones and regions, tags resources and manages SQS queues by
//! running the `aws` CLI with retries.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use msgbench_common::defaults::{
    DEFAULT_COMMAND_TIMEOUT_SECS, DEFAULT_MAX_ATTEMPTS, DEFAULT_QUEUE_NAME, DEFAULT_REGION,
};
use msgbench_common::tags::{RunContext, default_tags};
use msgbench_common::zone;
use msgbench_coordinator::aws::AwsCli;
use msgbench_coordinator::{CommandConfig, RetryPolicy};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "msgbench-coordinator")]
#[command(about = "AWS provisioning for messaging-queue benchmarks")]
#[command(version)]
struct Args {
    /// AWS profile to use (sets AWS_PROFILE for every CLI call)
    #[arg(long, global = true)]
    aws_profile: Option<String>,

    /// Per-attempt timeout for each CLI call, in seconds
    #[arg(long, global = true, default_value_t = DEFAULT_COMMAND_TIMEOUT_SECS)]
    command_timeout_secs: u64,

    /// Attempts (first run included) for retried CLI calls
    #[arg(
        long,
        global = true,
        default_value_t = DEFAULT_MAX_ATTEMPTS,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    max_attempts: u32,

    #[command(subcommand)]
    command: Command,
}

/// Who and what a new resource is tagged with
#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Run identifier (default: a fresh UUIDv7)
    #[arg(long)]
    run_id: Option<String>,

    /// Owner tag value
    #[arg(long, env = "USER", default_value = "unknown")]
    owner: String,

    /// Minutes until the resource may be reclaimed (adds a timeout tag)
    #[arg(long)]
    timeout_minutes: Option<u32>,
}

impl RunArgs {
    fn context(&self) -> RunContext {
        let run_id = self
            .run_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::now_v7().to_string());
        RunContext::new(run_id, self.owner.clone())
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List available zones in a region, or in every enabled region
    Zones {
        #[arg(long, default_value = DEFAULT_REGION, conflicts_with = "all")]
        region: String,

        /// List zones across all enabled regions
        #[arg(long)]
        all: bool,
    },

    /// List enabled regions
    Regions {
        /// Only regions in this geography (e.g. "us", "eu")
        #[arg(long)]
        geo: Option<String>,
    },

    /// Show the account (or ARN) of the current credentials
    Account {
        #[arg(long)]
        arn: bool,
    },

    /// Tag an existing EC2 resource
    Tag {
        #[arg(long, default_value = DEFAULT_REGION)]
        region: String,

        #[arg(long)]
        resource_id: String,

        /// Tag to set, as KEY=VALUE (repeatable)
        #[arg(long = "tag", value_parser = parse_tag)]
        tags: Vec<(String, String)>,

        /// Also set the standard msgbench tags
        #[arg(long)]
        defaults: bool,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Create a tagged SQS queue
    CreateQueue {
        #[arg(long, default_value = DEFAULT_REGION)]
        region: String,

        #[arg(long, default_value = DEFAULT_QUEUE_NAME)]
        queue_name: String,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Delete an SQS queue if it exists
    DeleteQueue {
        #[arg(long, default_value = DEFAULT_REGION)]
        region: String,

        #[arg(long, default_value = DEFAULT_QUEUE_NAME)]
        queue_name: String,
    },
}

/// Parse a KEY=VALUE tag argument
fn parse_tag(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}

/// Reject anything that is not a region name before calling AWS
fn require_region(region: &str) -> Result<()> {
    let is_region = zone::is_region(region)?;
    anyhow::ensure!(is_region, "'{region}' is a zone, expected a region");
    Ok(())
}

impl Args {
    fn command_config(&self) -> CommandConfig {
        CommandConfig {
            timeout: Duration::from_secs(self.command_timeout_secs),
            retry: RetryPolicy {
                max_attempts: self.max_attempts,
                ..RetryPolicy::default()
            },
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
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

    if std::env::var("RUST_BACKTRACE").is_err() {
        let _ = writeln!(
            stderr,
            "\n\x1b[2mSet RUST_BACKTRACE=1 for a detailed backtrace\x1b[0m"
        );
    } else {
        let backtrace = e.backtrace();
        if backtrace.status() == std::backtrace::BacktraceStatus::Captured {
            let _ = writeln!(stderr, "\n\x1b[2mBacktrace:\x1b[0m\n{backtrace}");
        }
    }
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialize output")?
    );
    Ok(())
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
    if let Some(profile) = &args.aws_profile {
        info!(profile = %profile, "Using AWS profile");
    }
    let aws = AwsCli::new(&args.command_config()).with_profile(args.aws_profile.clone());

    match args.command {
        Command::Zones { region, all } => {
            let zones = if all {
                aws.get_all_zones().await?
            } else {
                require_region(&region)?;
                aws.get_zones_in_region(&region).await?
            };
            print_json(&zones)?;
        }

        Command::Regions { geo } => {
            let regions = match geo {
                Some(geo) => aws.get_regions_in_geo(&geo).await?,
                None => aws.get_all_regions().await?,
            };
            print_json(&regions)?;
        }

        Command::Account { arn } => {
            if arn {
                println!("{}", aws.get_caller_arn().await?);
            } else {
                println!("{}", aws.get_account().await?);
            }
        }

        Command::Tag {
            region,
            resource_id,
            tags,
            defaults,
            run,
        } => {
            require_region(&region)?;
            let mut all_tags = if defaults {
                default_tags(&run.context(), run.timeout_minutes)
            } else {
                BTreeMap::new()
            };
            all_tags.extend(tags);
            aws.add_tags(&resource_id, &region, &all_tags).await?;
        }

        Command::CreateQueue {
            region,
            queue_name,
            run,
        } => {
            require_region(&region)?;
            let context = run.context();
            info!(run_id = %context.run_id, queue_name = %queue_name, "Creating queue");
            let tags = default_tags(&context, run.timeout_minutes);
            let queue_url = aws.create_queue(&queue_name, &region, &tags).await?;
            println!("{queue_url}");
        }

        Command::DeleteQueue { region, queue_name } => {
            require_region(&region)?;
            if !aws.delete_queue(&queue_name, &region).await? {
                info!(queue_name = %queue_name, "Nothing to delete");
            }
        }
    }

    Ok(())
}
