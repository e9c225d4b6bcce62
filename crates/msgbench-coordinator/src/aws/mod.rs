//! AWS provisioning through the `aws` command-line tool
//!
//! Every call goes through a [`CommandRunner`], so the same failure
//! classification and retry budget apply to all of them:
//! - zones: availability zones and regions
//! - account: caller identity (STS)
//! - tags: EC2 resource tagging
//! - queue: SQS queue lifecycle

pub mod account;
pub mod queue;
pub mod tags;
pub mod zones;

pub use account::{AccountId, CallerIdentity};

use crate::command::{CommandExecutor, CommandRunner, CommandSpec, ProcessExecutor};
use crate::config::CommandConfig;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

/// Leading arguments of every `aws` invocation
pub const AWS_PREFIX: [&str; 3] = ["aws", "--output", "json"];

/// The `aws` CLI, run through a [`CommandRunner`]
#[derive(Debug, Clone)]
pub struct AwsCli<E = ProcessExecutor> {
    runner: CommandRunner<E>,
    profile: Option<String>,
}

impl AwsCli<ProcessExecutor> {
    pub fn new(config: &CommandConfig) -> Self {
        Self::with_runner(CommandRunner::new(config))
    }
}

impl<E: CommandExecutor> AwsCli<E> {
    pub fn with_runner(runner: CommandRunner<E>) -> Self {
        Self {
            runner,
            profile: None,
        }
    }

    /// Run every command with `AWS_PROFILE` set to `profile`
    pub fn with_profile(mut self, profile: Option<String>) -> Self {
        self.profile = profile;
        self
    }

    pub fn runner(&self) -> &CommandRunner<E> {
        &self.runner
    }

    /// `aws --output json <args>`, with the profile overlay if one is set
    pub fn command<I, S>(&self, args: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let spec = CommandSpec::new(
            AWS_PREFIX
                .into_iter()
                .map(String::from)
                .chain(args.into_iter().map(Into::into)),
        );
        match &self.profile {
            Some(profile) => spec.env("AWS_PROFILE", profile),
            None => spec,
        }
    }

    /// Run once and parse stdout as JSON
    async fn query<T: DeserializeOwned>(&self, spec: &CommandSpec) -> Result<T> {
        let result = self
            .runner
            .run(spec)
            .await
            .with_context(|| format!("Failed to run `{spec}`"))?;
        serde_json::from_str(&result.stdout)
            .with_context(|| format!("Failed to parse output of `{spec}`"))
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{cli, ok};

    #[test]
    fn commands_start_with_the_json_prefix() {
        let aws = cli([]);
        let spec = aws.command(["sts", "get-caller-identity"]);
        assert_eq!(
            spec.args(),
            ["aws", "--output", "json", "sts", "get-caller-identity"]
        );
        assert!(spec.env_overlay().is_empty());
    }

    #[test]
    fn profile_is_passed_through_the_environment() {
        let aws = cli([]).with_profile(Some("bench".to_string()));
        let spec = aws.command(["sqs", "list-queues"]);
        assert_eq!(
            spec.env_overlay(),
            [("AWS_PROFILE".to_string(), "bench".to_string())]
        );
    }

    #[tokio::test]
    async fn profile_reaches_every_executed_command() {
        let identity = r#"{"UserId": "u", "Account": "123456789012", "Arn": "arn"}"#;
        let aws = cli([ok(identity), ok(identity)]).with_profile(Some("bench".to_string()));

        aws.get_account().await.unwrap();
        aws.get_caller_arn().await.unwrap();

        let specs = aws.runner().executor().seen_specs();
        assert_eq!(specs.len(), 2);
        for spec in specs {
            assert_eq!(
                spec.env_overlay(),
                [("AWS_PROFILE".to_string(), "bench".to_string())]
            );
        }
    }
}
