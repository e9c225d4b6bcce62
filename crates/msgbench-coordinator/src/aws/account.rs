//! AWS account validation and identity

use super::AwsCli;
use crate::command::CommandExecutor;
use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

/// Strongly-typed AWS account ID (12-digit string)
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display, derive_more::Deref)]
pub struct AccountId(String);

/// Response of `sts get-caller-identity`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CallerIdentity {
    pub user_id: String,
    pub account: String,
    pub arn: String,
}

impl<E: CommandExecutor> AwsCli<E> {
    /// Identity of the credentials the CLI runs with
    pub async fn caller_identity(&self) -> Result<CallerIdentity> {
        let spec = self.command(["sts", "get-caller-identity"]);
        self.query(&spec)
            .await
            .context("Failed to get AWS caller identity - check credentials")
    }

    /// Account that owns the calling credentials
    pub async fn get_account(&self) -> Result<AccountId> {
        let identity = self.caller_identity().await?;
        info!(account_id = %identity.account, "AWS account validated");
        Ok(AccountId(identity.account))
    }

    /// ARN of the calling credentials
    pub async fn get_caller_arn(&self) -> Result<String> {
        Ok(self.caller_identity().await?.arn)
    }
}
