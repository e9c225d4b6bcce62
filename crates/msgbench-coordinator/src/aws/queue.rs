//! SQS queue lifecycle

use super::AwsCli;
use crate::command::CommandExecutor;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Error code the CLI prints for a queue that does not exist
const NON_EXISTENT_QUEUE: &str = "NonExistentQueue";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct QueueUrlResponse {
    queue_url: String,
}

/// `k1=v1,k2=v2` shorthand accepted by `sqs create-queue --tags`
fn format_queue_tags(tags: &BTreeMap<String, String>) -> String {
    tags.iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(",")
}

impl<E: CommandExecutor> AwsCli<E> {
    /// Create (or look up an identical) queue and return its URL
    pub async fn create_queue(
        &self,
        queue_name: &str,
        region: &str,
        tags: &BTreeMap<String, String>,
    ) -> Result<String> {
        let mut args = vec![
            "sqs".to_string(),
            "create-queue".to_string(),
            format!("--region={region}"),
            "--queue-name".to_string(),
            queue_name.to_string(),
        ];
        if !tags.is_empty() {
            args.push("--tags".to_string());
            args.push(format_queue_tags(tags));
        }

        let spec = self.command(args);
        let result = self
            .runner()
            .run_retryable(&spec)
            .await
            .with_context(|| format!("Failed to create queue '{queue_name}'"))?;
        let response: QueueUrlResponse = serde_json::from_str(&result.stdout)
            .with_context(|| format!("Failed to parse output of `{spec}`"))?;

        info!(queue_name, region, queue_url = %response.queue_url, "Queue created");
        Ok(response.queue_url)
    }

    /// URL of `queue_name`, or `None` when it does not exist
    pub async fn get_queue_url(&self, queue_name: &str, region: &str) -> Result<Option<String>> {
        let spec = self
            .command([
                "sqs".to_string(),
                "get-queue-url".to_string(),
                format!("--region={region}"),
                "--queue-name".to_string(),
                queue_name.to_string(),
            ])
            .suppress_failure(|result| result.stderr.contains(NON_EXISTENT_QUEUE));

        let result = self
            .runner()
            .run(&spec)
            .await
            .with_context(|| format!("Failed to look up queue '{queue_name}'"))?;
        if !result.success() {
            debug!(queue_name, region, "Queue does not exist");
            return Ok(None);
        }

        let response: QueueUrlResponse = serde_json::from_str(&result.stdout)
            .with_context(|| format!("Failed to parse output of `{spec}`"))?;
        Ok(Some(response.queue_url))
    }

    /// Delete `queue_name`; returns false when there was nothing to delete
    pub async fn delete_queue(&self, queue_name: &str, region: &str) -> Result<bool> {
        let Some(queue_url) = self.get_queue_url(queue_name, region).await? else {
            info!(queue_name, region, "Queue already deleted");
            return Ok(false);
        };

        let spec = self.command([
            "sqs".to_string(),
            "delete-queue".to_string(),
            format!("--region={region}"),
            "--queue-url".to_string(),
            queue_url.clone(),
        ]);
        self.runner()
            .run_retryable(&spec)
            .await
            .with_context(|| format!("Failed to delete queue '{queue_name}'"))?;

        info!(queue_name, region, queue_url = %queue_url, "Queue deleted");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{cli, failed, ok};
    use super::*;

    const URL: &str = "https://sqs.us-west-1.amazonaws.com/123456789012/bench";
    const MISSING: &str = "An error occurred (AWS.SimpleQueueService.NonExistentQueue) \
                           when calling the GetQueueUrl operation";

    fn url_response() -> String {
        format!(r#"{{"QueueUrl": "{URL}"}}"#)
    }

    #[test]
    fn queue_tags_use_map_shorthand() {
        let tags = BTreeMap::from([
            ("msgbench:tool".to_string(), "msgbench".to_string()),
            ("msgbench:run-id".to_string(), "r1".to_string()),
        ]);
        assert_eq!(
            format_queue_tags(&tags),
            "msgbench:run-id=r1,msgbench:tool=msgbench"
        );
    }

    #[tokio::test]
    async fn create_queue_returns_url() {
        let aws = cli([ok(&url_response())]);
        let tags = BTreeMap::from([("owner".to_string(), "alice".to_string())]);
        let url = aws.create_queue("bench", "us-west-1", &tags).await.unwrap();
        assert_eq!(url, URL);

        let args = &aws.runner().executor().seen()[0];
        assert_eq!(
            args[3..],
            [
                "sqs",
                "create-queue",
                "--region=us-west-1",
                "--queue-name",
                "bench",
                "--tags",
                "owner=alice"
            ]
        );
    }

    #[tokio::test]
    async fn missing_queue_has_no_url() {
        let aws = cli([failed(254, MISSING)]);
        assert_eq!(aws.get_queue_url("bench", "us-west-1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn other_lookup_failures_are_errors() {
        let aws = cli([failed(255, "AccessDenied")]);
        assert!(aws.get_queue_url("bench", "us-west-1").await.is_err());
    }

    #[tokio::test]
    async fn delete_resolves_then_deletes() {
        let aws = cli([ok(&url_response()), ok("")]);
        assert!(aws.delete_queue("bench", "us-west-1").await.unwrap());

        let seen = aws.runner().executor().seen();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1][4], "delete-queue");
        assert_eq!(seen[1].last().map(String::as_str), Some(URL));
    }

    #[tokio::test]
    async fn deleting_a_missing_queue_is_not_an_error() {
        let aws = cli([failed(254, MISSING)]);
        assert!(!aws.delete_queue("bench", "us-west-1").await.unwrap());
        assert_eq!(aws.runner().executor().seen().len(), 1);
    }
}
