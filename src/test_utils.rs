//! Test utilities for token-widget.
//!
//! Shared helpers and data factories for unit and integration tests.
//!
//! # Usage
//!
//! ```rust,ignore
//! use token_widget::test_utils::*;
//!
//! let (dir, store) = temp_state_store();
//! let sources = ScriptedSources::new(|| Ok(42.5), || Ok(make_test_counts()));
//! ```

use std::path::PathBuf;

use crate::core::engine::UsageSources;
use crate::core::models::TokenCounts;
use crate::error::Result;
use crate::storage::state::StateStore;

// =============================================================================
// Scripted Sources
// =============================================================================

/// Usage sources backed by plain closures, for driving the engine without
/// network or subprocesses. Each closure runs once per cycle, so scripted
/// errors are constructed fresh every time.
pub struct ScriptedSources<P, Q> {
    primary_fn: P,
    secondary_fn: Q,
}

impl<P, Q> ScriptedSources<P, Q>
where
    P: Fn() -> Result<f64> + Send + Sync + 'static,
    Q: Fn() -> Result<TokenCounts> + Send + Sync + 'static,
{
    pub fn new(primary_fn: P, secondary_fn: Q) -> Self {
        Self {
            primary_fn,
            secondary_fn,
        }
    }
}

impl<P, Q> UsageSources for ScriptedSources<P, Q>
where
    P: Fn() -> Result<f64> + Send + Sync + 'static,
    Q: Fn() -> Result<TokenCounts> + Send + Sync + 'static,
{
    async fn primary(&self) -> Result<f64> {
        (self.primary_fn)()
    }

    async fn secondary(&self) -> Result<TokenCounts> {
        (self.secondary_fn)()
    }
}

// =============================================================================
// Test Data Factories
// =============================================================================

/// Token counts matching the canonical reconciliation scenario.
#[must_use]
pub const fn make_test_counts() -> TokenCounts {
    TokenCounts {
        input_tokens: 1000,
        output_tokens: 200,
        block_total_tokens: 1500,
    }
}

/// A `ccusage blocks --json` document with one finished, one gap, and one
/// active block.
#[must_use]
pub fn sample_blocks_json() -> &'static str {
    r#"{
        "blocks": [
            {
                "id": "2026-08-05T10:00:00.000Z",
                "startTime": "2026-08-05T10:00:00.000Z",
                "endTime": "2026-08-05T15:00:00.000Z",
                "isActive": false,
                "isGap": false,
                "tokenCounts": {
                    "inputTokens": 500,
                    "outputTokens": 100,
                    "cacheCreationInputTokens": 2000,
                    "cacheReadInputTokens": 9000
                },
                "totalTokens": 11600
            },
            {
                "id": "2026-08-05T15:00:00.000Z",
                "isActive": false,
                "isGap": true,
                "tokenCounts": {},
                "totalTokens": 0
            },
            {
                "id": "2026-08-06T08:00:00.000Z",
                "startTime": "2026-08-06T08:00:00.000Z",
                "endTime": "2026-08-06T13:00:00.000Z",
                "isActive": true,
                "isGap": false,
                "tokenCounts": {
                    "inputTokens": 1000,
                    "outputTokens": 200,
                    "cacheCreationInputTokens": 50,
                    "cacheReadInputTokens": 250
                },
                "totalTokens": 1500
            }
        ]
    }"#
}

// =============================================================================
// Filesystem Helpers
// =============================================================================

/// A state store over a fresh temp directory. Keep the directory alive for
/// the duration of the test.
#[must_use]
pub fn temp_state_store() -> (tempfile::TempDir, StateStore) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let store = StateStore::at(dir.path().join("config.json"));
    (dir, store)
}

/// Write a credential file with the given token into a temp directory and
/// return its path alongside the directory guard.
#[must_use]
pub fn temp_credentials(token: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join(".credentials.json");
    let content = format!(r#"{{"claudeAiOauth": {{"accessToken": "{token}"}}}}"#);
    std::fs::write(&path, content).expect("failed to write credentials");
    (dir, path)
}
