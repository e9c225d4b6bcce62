//! EC2 resource tagging

use super::AwsCli;
use crate::command::CommandExecutor;
use anyhow::{Context, Result};
use msgbench_common::tags::{RunContext, default_tags, format_tags};
use std::collections::BTreeMap;
use tracing::{debug, info};

impl<E: CommandExecutor> AwsCli<E> {
    /// Set `tags` on an existing resource; a no-op for an empty map
    pub async fn add_tags(
        &self,
        resource_id: &str,
        region: &str,
        tags: &BTreeMap<String, String>,
    ) -> Result<()> {
        if tags.is_empty() {
            debug!(resource_id, "No tags to add");
            return Ok(());
        }

        let mut args = vec![
            "ec2".to_string(),
            "create-tags".to_string(),
            format!("--region={region}"),
            "--resources".to_string(),
            resource_id.to_string(),
            "--tags".to_string(),
        ];
        args.extend(format_tags(tags));

        self.runner()
            .run_retryable(&self.command(args))
            .await
            .with_context(|| format!("Failed to tag {resource_id}"))?;
        info!(resource_id, region, count = tags.len(), "Tagged resource");
        Ok(())
    }

    /// Set the standard msgbench tags for `run` on an existing resource
    pub async fn add_default_tags(
        &self,
        resource_id: &str,
        region: &str,
        run: &RunContext,
        timeout_minutes: Option<u32>,
    ) -> Result<()> {
        self.add_tags(resource_id, region, &default_tags(run, timeout_minutes))
            .await
    }
}
