//! Persisted settings + snapshot record.
//!
//! One JSON file holds the refresh settings and the last known snapshot.
//! Loading never fails: a missing or corrupt file falls back to defaults,
//! and a below-floor refresh interval self-heals to the default interval
//! (not the floor). Writes go through a temp file + rename so an
//! interrupted save leaves the previous good file intact.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::models::{DEFAULT_REFRESH, MIN_REFRESH, Settings, UsageSnapshot};
use crate::error::Result;
use crate::storage::paths;

/// The combined record as stored on disk.
///
/// `refresh_interval` is serialized as integer nanoseconds; all fields
/// round-trip exactly. Unknown fields in the file are ignored, missing
/// fields default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(with = "duration_nanos", default = "default_refresh")]
    pub refresh_interval: Duration,
    #[serde(default)]
    pub pinned_on_top: bool,
    #[serde(default)]
    pub input_tokens_used: u64,
    #[serde(default)]
    pub output_tokens_used: u64,
    #[serde(default)]
    pub block_total_tokens: u64,
    #[serde(default)]
    pub indicator_percent: f64,
}

const fn default_refresh() -> Duration {
    DEFAULT_REFRESH
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH,
            pinned_on_top: false,
            input_tokens_used: 0,
            output_tokens_used: 0,
            block_total_tokens: 0,
            indicator_percent: 0.0,
        }
    }
}

impl PersistedState {
    /// The settings portion of the record.
    #[must_use]
    pub const fn settings(&self) -> Settings {
        Settings {
            refresh_interval: self.refresh_interval,
            pinned_on_top: self.pinned_on_top,
        }
    }

    /// The snapshot portion of the record.
    #[must_use]
    pub const fn snapshot(&self) -> UsageSnapshot {
        UsageSnapshot {
            input_tokens_used: self.input_tokens_used,
            output_tokens_used: self.output_tokens_used,
            block_total_tokens: self.block_total_tokens,
            indicator_percent: self.indicator_percent,
        }
    }

    /// Replace the snapshot portion.
    pub const fn apply_snapshot(&mut self, snapshot: UsageSnapshot) {
        self.input_tokens_used = snapshot.input_tokens_used;
        self.output_tokens_used = snapshot.output_tokens_used;
        self.block_total_tokens = snapshot.block_total_tokens;
        self.indicator_percent = snapshot.indicator_percent;
    }

    /// Replace the settings portion.
    pub const fn apply_settings(&mut self, settings: Settings) {
        self.refresh_interval = settings.refresh_interval;
        self.pinned_on_top = settings.pinned_on_top;
    }
}

/// Serialize `Duration` as integer nanoseconds; the on-disk format must
/// round-trip exactly across versions.
mod duration_nanos {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_nanos() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let nanos = u64::deserialize(deserializer)?;
        Ok(Duration::from_nanos(nanos))
    }
}

/// Store for the combined settings + snapshot record.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// Store over the default per-user location.
    #[must_use]
    pub fn new() -> Self {
        Self {
            path: paths::state_file(),
        }
    }

    /// Store over an explicit file path.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file this store reads and writes.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the record, falling back to defaults when the file is missing
    /// or corrupt. An interval below [`MIN_REFRESH`] self-heals to
    /// [`DEFAULT_REFRESH`].
    #[must_use]
    pub fn load(&self) -> PersistedState {
        let mut state: PersistedState = std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|data| serde_json::from_str(&data).ok())
            .unwrap_or_default();

        if state.refresh_interval < MIN_REFRESH {
            tracing::debug!(
                interval_ns = state.refresh_interval.as_nanos() as u64,
                "stored refresh interval below floor, resetting to default"
            );
            state.refresh_interval = DEFAULT_REFRESH;
        }

        state
    }

    /// Persist the record.
    ///
    /// The write goes to a temp file in the same directory and is renamed
    /// into place. The parent directory is created if needed.
    ///
    /// # Errors
    ///
    /// Returns error on I/O or serialization failure.
    pub fn save(&self, state: &PersistedState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let data = serde_json::to_string_pretty(state)?;

        // Temp file must live in the same directory for the rename to be atomic.
        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        let temp_path = parent.join(format!(
            ".{}.tmp.{}",
            self.path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("state"),
            std::process::id()
        ));

        {
            let mut file = std::fs::File::create(&temp_path)?;
            file.write_all(data.as_bytes())?;
            file.sync_all()?;
        }
        std::fs::rename(&temp_path, &self.path)?;

        Ok(())
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, StateStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = StateStore::at(dir.path().join("config.json"));
        (dir, store)
    }

    #[test]
    fn missing_file_loads_defaults() {
        let (_dir, store) = temp_store();
        assert_eq!(store.load(), PersistedState::default());
    }

    #[test]
    fn corrupt_file_loads_defaults() {
        let (_dir, store) = temp_store();
        std::fs::write(store.path(), "{{{{not json").expect("write");
        assert_eq!(store.load(), PersistedState::default());
    }

    #[test]
    fn below_floor_interval_resets_to_default_not_floor() {
        let (_dir, store) = temp_store();
        // 5 seconds, well under the 30-second floor.
        std::fs::write(store.path(), r#"{"refresh_interval": 5000000000}"#).expect("write");
        let state = store.load();
        assert_eq!(state.refresh_interval, DEFAULT_REFRESH);
        assert_ne!(state.refresh_interval, MIN_REFRESH);
    }

    #[test]
    fn at_floor_interval_is_kept() {
        let (_dir, store) = temp_store();
        std::fs::write(store.path(), r#"{"refresh_interval": 30000000000}"#).expect("write");
        assert_eq!(store.load().refresh_interval, MIN_REFRESH);
    }

    #[test]
    fn save_then_load_round_trips() {
        let (_dir, store) = temp_store();
        let state = PersistedState {
            refresh_interval: Duration::from_secs(90),
            pinned_on_top: true,
            input_tokens_used: 1000,
            output_tokens_used: 200,
            block_total_tokens: 1500,
            indicator_percent: 42.5,
        };
        store.save(&state).expect("save");
        assert_eq!(store.load(), state);
    }

    #[test]
    fn interval_serializes_as_nanoseconds() {
        let (_dir, store) = temp_store();
        let state = PersistedState {
            refresh_interval: Duration::from_secs(90),
            ..PersistedState::default()
        };
        store.save(&state).expect("save");

        let raw = std::fs::read_to_string(store.path()).expect("read");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("parse");
        assert_eq!(value["refresh_interval"].as_u64(), Some(90_000_000_000));
    }

    #[test]
    fn missing_fields_default() {
        let (_dir, store) = temp_store();
        std::fs::write(store.path(), r#"{"refresh_interval": 60000000000}"#).expect("write");
        let state = store.load();
        assert_eq!(state.input_tokens_used, 0);
        assert!(!state.pinned_on_top);
        assert!(state.indicator_percent.abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let (_dir, store) = temp_store();
        std::fs::write(
            store.path(),
            r#"{"refresh_interval": 60000000000, "future_field": "yes"}"#,
        )
        .expect("write");
        assert_eq!(store.load().refresh_interval, DEFAULT_REFRESH);
    }

    #[test]
    fn save_overwrites_previous_record() {
        let (_dir, store) = temp_store();
        let mut state = PersistedState::default();
        store.save(&state).expect("first save");

        state.indicator_percent = 99.0;
        store.save(&state).expect("second save");
        assert!((store.load().indicator_percent - 99.0).abs() < f64::EPSILON);
    }

    #[test]
    fn settings_and_snapshot_views_split_the_record() {
        let state = PersistedState {
            refresh_interval: Duration::from_secs(45),
            pinned_on_top: true,
            input_tokens_used: 10,
            output_tokens_used: 20,
            block_total_tokens: 30,
            indicator_percent: 12.5,
        };
        let settings = state.settings();
        assert_eq!(settings.refresh_interval, Duration::from_secs(45));
        assert!(settings.pinned_on_top);

        let snapshot = state.snapshot();
        assert_eq!(snapshot.input_tokens_used, 10);
        assert_eq!(snapshot.block_total_tokens, 30);
    }
}
