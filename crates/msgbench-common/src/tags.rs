//! AWS resource tags for msgbench
//!
//! Every resource msgbench provisions is tagged with these standard tags so
//! runs can be discovered and cleaned up later. The formatting helpers turn a
//! tag map into the argument shapes the `aws` CLI expects.
//!
//! ## Tag Schema
//!
//! | Tag Key | Description |
//! |---------|-------------|
//! | `msgbench:tool` | Static identifier ("msgbench") |
//! | `msgbench:run-id` | Unique run identifier (UUID) |
//! | `msgbench:owner` | User that started the run |
//! | `msgbench:created-at` | RFC 3339 creation timestamp |
//! | `msgbench:timeout-utc` | RFC 3339 time after which the resource may be reaped (optional) |

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Tag key for tool identification - all msgbench resources have this
pub const TAG_TOOL: &str = "msgbench:tool";

/// Tag value for tool identification
pub const TAG_TOOL_VALUE: &str = "msgbench";

/// Tag key for run ID - unique identifier per benchmark run
pub const TAG_RUN_ID: &str = "msgbench:run-id";

/// Tag key for the user that started the run
pub const TAG_OWNER: &str = "msgbench:owner";

/// Tag key for creation timestamp (RFC 3339 format)
pub const TAG_CREATED_AT: &str = "msgbench:created-at";

/// Tag key for the reap deadline (RFC 3339 format)
pub const TAG_TIMEOUT_UTC: &str = "msgbench:timeout-utc";

/// Run-level facts the default tags are derived from
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub owner: String,
    pub created_at: DateTime<Utc>,
}

impl RunContext {
    pub fn new(run_id: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            owner: owner.into(),
            created_at: Utc::now(),
        }
    }
}

/// Default tags for a resource created during a run.
///
/// `timeout_minutes` adds a reap deadline relative to the creation time.
pub fn default_tags(run: &RunContext, timeout_minutes: Option<u32>) -> BTreeMap<String, String> {
    let mut tags = BTreeMap::from([
        (TAG_TOOL.to_string(), TAG_TOOL_VALUE.to_string()),
        (TAG_RUN_ID.to_string(), run.run_id.clone()),
        (TAG_OWNER.to_string(), run.owner.clone()),
        (TAG_CREATED_AT.to_string(), format_created_at(run.created_at)),
    ]);
    if let Some(minutes) = timeout_minutes {
        let deadline = run.created_at + chrono::Duration::minutes(i64::from(minutes));
        tags.insert(TAG_TIMEOUT_UTC.to_string(), format_created_at(deadline));
    }
    tags
}

/// Format tags as arguments for the CLI `--tags` parameter, sorted by key
pub fn format_tags(tags: &BTreeMap<String, String>) -> Vec<String> {
    tags.iter()
        .map(|(k, v)| format!("Key={k},Value={v}"))
        .collect()
}

/// Format tags as the value of the CLI `--tag-specifications` parameter
pub fn format_tag_specifications(resource_type: &str, tags: &BTreeMap<String, String>) -> String {
    let tags = tags
        .iter()
        .map(|(k, v)| format!("{{Key={k},Value={v}}}"))
        .collect::<Vec<_>>()
        .join(",");
    format!("ResourceType={resource_type},Tags=[{tags}]")
}

/// Build a CLI filter argument list: `--filters Name=k,Values=v ...`
pub fn aws_filter(filters: &BTreeMap<String, String>) -> Vec<String> {
    std::iter::once("--filters".to_string())
        .chain(filters.iter().map(|(k, v)| format!("Name={k},Values={v}")))
        .collect()
}

/// Helper to format creation timestamp for tags
pub fn format_created_at(time: DateTime<Utc>) -> String {
    time.to_rfc3339()
}

/// Helper to parse creation timestamp from tags
pub fn parse_created_at(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
