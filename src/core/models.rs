//! Core data types shared across sources, reconciler, and storage.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Floor for the refresh interval.
pub const MIN_REFRESH: Duration = Duration::from_secs(30);

/// Default refresh interval, also the self-heal target for below-floor
/// persisted values.
pub const DEFAULT_REFRESH: Duration = Duration::from_secs(60);

/// Token counts for the active usage window, as reported by the secondary
/// source. Carries no percentage; that dimension belongs to the primary
/// source alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenCounts {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub block_total_tokens: u64,
}

/// The reconciled usage record displayed and persisted at any given time.
///
/// Constructed each refresh cycle, persisted immediately, superseded by the
/// next cycle's result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    pub input_tokens_used: u64,
    pub output_tokens_used: u64,
    pub block_total_tokens: u64,
    /// Utilization of the current quota window on a 0-100+ scale.
    /// Authoritative from the primary source; never derived from token
    /// counts.
    pub indicator_percent: f64,
}

impl UsageSnapshot {
    /// Snapshot carrying the given token counts and percentage.
    #[must_use]
    pub const fn from_counts(counts: TokenCounts, indicator_percent: f64) -> Self {
        Self {
            input_tokens_used: counts.input_tokens,
            output_tokens_used: counts.output_tokens,
            block_total_tokens: counts.block_total_tokens,
            indicator_percent,
        }
    }
}

/// User-mutable settings, persisted together with the latest snapshot in
/// one record. Mutated only through explicit collaborator calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub refresh_interval: Duration,
    pub pinned_on_top: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH,
            pinned_on_top: false,
        }
    }
}
