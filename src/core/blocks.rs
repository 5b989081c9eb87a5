//! Secondary usage source: token counts from the `ccusage` accounting tool.
//!
//! Invokes `npx ccusage blocks --json` as a child process and extracts
//! token detail for the currently active five-hour window. The listing is
//! ordered by the tool; the first entry that is active and not a gap is the
//! current window. No active window is a degraded success with zero counts,
//! not an error.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::core::cli_runner::run_json_command;
use crate::core::models::TokenCounts;
use crate::error::Result;

/// Launcher for the accounting tool.
pub const TOOL_PROGRAM: &str = "npx";

/// Arguments requesting a machine-readable listing of usage blocks.
pub const BLOCKS_ARGS: &[&str] = &["--yes", "ccusage@latest", "blocks", "--json"];

/// JSON document produced by `ccusage blocks --json`.
#[derive(Debug, Deserialize)]
pub struct BlocksReport {
    #[serde(default)]
    pub blocks: Vec<UsageBlock>,
}

/// One usage-window entry from the tool's ordered listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageBlock {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_gap: bool,
    #[serde(default)]
    pub token_counts: BlockTokenCounts,
    #[serde(default)]
    pub total_tokens: u64,
}

/// Per-block token detail.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockTokenCounts {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default)]
    pub cache_creation_input_tokens: u64,
    #[serde(default)]
    pub cache_read_input_tokens: u64,
}

/// Select the current window's token counts.
///
/// First block with `is_active && !is_gap` wins; order is significant. Zero
/// counts when no block qualifies.
#[must_use]
pub fn active_counts(blocks: &[UsageBlock]) -> TokenCounts {
    blocks
        .iter()
        .find(|b| b.is_active && !b.is_gap)
        .map_or_else(TokenCounts::default, |b| TokenCounts {
            input_tokens: b.token_counts.input_tokens,
            output_tokens: b.token_counts.output_tokens,
            block_total_tokens: b.total_tokens,
        })
}

/// Fetch token counts for the active window.
///
/// `timeout` of `None` (the production default) lets the tool run
/// unbounded.
///
/// # Errors
///
/// - [`crate::error::WidgetError::ToolNotFound`] if `npx` cannot be located
/// - [`crate::error::WidgetError::ProcessFailed`] if the tool cannot be
///   started or exits non-zero
/// - [`crate::error::WidgetError::ParseResponse`] if output is not
///   well-formed
pub async fn fetch_blocks(timeout: Option<Duration>) -> Result<TokenCounts> {
    let report: BlocksReport = run_json_command(TOOL_PROGRAM, BLOCKS_ARGS, timeout).await?;
    tracing::debug!(blocks = report.blocks.len(), "ccusage blocks parsed");
    Ok(active_counts(&report.blocks))
}
