//! Engine cycle tests with scripted sources and temp storage.
//!
//! Drives full fetch-reconcile-persist-publish cycles without touching the
//! network or spawning subprocesses, verifying:
//! - The startup cycle runs immediately and publishes the reconciled snapshot
//! - Manual refreshes are idempotent when the sources repeat themselves
//! - Degraded-mode fallbacks and the normalized credential status message

use std::time::Duration;

use tokio::sync::mpsc;

use token_widget::core::blocks::{BlocksReport, active_counts};
use token_widget::core::engine::{Engine, EngineHandle, REFRESHING, UsageSources};
use token_widget::core::models::{TokenCounts, UsageSnapshot};
use token_widget::error::WidgetError;
use token_widget::storage::state::{PersistedState, StateStore};
use token_widget::test_utils::{
    ScriptedSources, make_test_counts, sample_blocks_json, temp_state_store,
};

type Update = (UsageSnapshot, String);

/// Start the engine with a channel-backed snapshot callback.
fn watch<S: UsageSources>(engine: Engine<S>) -> (EngineHandle, mpsc::UnboundedReceiver<Update>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = engine
        .on_snapshot_updated(move |snapshot, status| {
            let _ = tx.send((snapshot, status.to_string()));
        })
        .start();
    (handle, rx)
}

/// Await the next cycle outcome, skipping the leading `Refreshing…` update.
async fn next_outcome(rx: &mut mpsc::UnboundedReceiver<Update>) -> Update {
    loop {
        let update = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for a snapshot update")
            .expect("snapshot channel closed");
        if update.1 != REFRESHING {
            return update;
        }
    }
}

#[tokio::test]
async fn startup_cycle_publishes_and_persists_reconciled_snapshot() {
    let (_dir, store) = temp_state_store();
    let engine = Engine::with_parts(
        ScriptedSources::new(|| Ok(42.5), || Ok(make_test_counts())),
        store.clone(),
    );
    let (handle, mut rx) = watch(engine);

    let (snapshot, status) = next_outcome(&mut rx).await;
    assert_eq!(snapshot.input_tokens_used, 1000);
    assert_eq!(snapshot.output_tokens_used, 200);
    assert_eq!(snapshot.block_total_tokens, 1500);
    assert!((snapshot.indicator_percent - 42.5).abs() < f64::EPSILON);
    assert!(status.starts_with("Updated: "), "status: {status}");

    // Persisted immediately, before the callback returned to us, and
    // readable back through the handle.
    assert_eq!(store.load().snapshot(), snapshot);
    assert_eq!(handle.snapshot(), snapshot);
}

#[tokio::test]
async fn refreshing_status_precedes_each_outcome() {
    let (_dir, store) = temp_state_store();
    let engine = Engine::with_parts(
        ScriptedSources::new(|| Ok(10.0), || Ok(TokenCounts::default())),
        store,
    );
    let (_handle, mut rx) = watch(engine);

    let first = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out")
        .expect("channel closed");
    assert_eq!(first.1, REFRESHING);
}

#[tokio::test]
async fn repeated_manual_refresh_is_idempotent() {
    let (_dir, store) = temp_state_store();
    let engine = Engine::with_parts(
        ScriptedSources::new(|| Ok(42.5), || Ok(make_test_counts())),
        store.clone(),
    );
    let (handle, mut rx) = watch(engine);

    let (startup_snapshot, _) = next_outcome(&mut rx).await;

    assert!(handle.trigger_manual_refresh());
    let (first, _) = next_outcome(&mut rx).await;

    assert!(handle.trigger_manual_refresh());
    let (second, _) = next_outcome(&mut rx).await;

    assert_eq!(startup_snapshot, first);
    assert_eq!(first, second);
    assert_eq!(store.load().snapshot(), second);
}

#[tokio::test]
async fn both_sources_failing_surfaces_primary_error_text() {
    let (_dir, store) = temp_state_store();
    let engine = Engine::with_parts(
        ScriptedSources::new(
            || Err(WidgetError::Network("connection refused".to_string())),
            || Err(WidgetError::ToolNotFound("npx".to_string())),
        ),
        store.clone(),
    );
    let (_handle, mut rx) = watch(engine);

    let (snapshot, status) = next_outcome(&mut rx).await;
    assert_eq!(status, "Error: API request failed: connection refused");
    // Nothing was reconciled, so the previous (default) snapshot stands and
    // nothing was written.
    assert_eq!(snapshot, UsageSnapshot::default());
    assert!(!store.path().exists());
}

#[tokio::test]
async fn credential_failure_normalizes_to_not_logged_in() {
    let (_dir, store) = temp_state_store();
    let engine = Engine::with_parts(
        ScriptedSources::new(
            || Err(WidgetError::CredentialsEmptyToken),
            || {
                Err(WidgetError::ProcessFailed {
                    program: "npx".to_string(),
                    reason: "exit code 1".to_string(),
                })
            },
        ),
        store,
    );
    let (_handle, mut rx) = watch(engine);

    let (_, status) = next_outcome(&mut rx).await;
    assert_eq!(status, "Error: Claude not logged in");
}

#[tokio::test]
async fn primary_failure_keeps_previous_percent_with_fresh_tokens() {
    let (_dir, store) = temp_state_store();

    // Seed the store with a snapshot from an earlier run.
    let seeded = PersistedState {
        indicator_percent: 37.5,
        input_tokens_used: 900,
        ..PersistedState::default()
    };
    store.save(&seeded).expect("seed save");

    let engine = Engine::with_parts(
        ScriptedSources::new(
            || {
                Err(WidgetError::HttpStatus {
                    status: 401,
                    body: "invalid bearer token".to_string(),
                })
            },
            // Zero active windows: degraded success with zero counts.
            || Ok(TokenCounts::default()),
        ),
        store.clone(),
    );
    let (_handle, mut rx) = watch(engine);

    let (snapshot, status) = next_outcome(&mut rx).await;
    assert_eq!(snapshot.input_tokens_used, 0);
    assert_eq!(snapshot.output_tokens_used, 0);
    assert_eq!(snapshot.block_total_tokens, 0);
    assert!((snapshot.indicator_percent - 37.5).abs() < f64::EPSILON);
    // The cycle still counts as an update; the secondary source succeeded.
    assert!(status.starts_with("Updated: "), "status: {status}");
    assert_eq!(store.load().snapshot(), snapshot);
}

#[tokio::test]
async fn secondary_failure_zeroes_tokens_but_reports_percent() {
    let (_dir, store) = temp_state_store();
    let engine = Engine::with_parts(
        ScriptedSources::new(
            || Ok(63.0),
            || {
                Err(WidgetError::ProcessFailed {
                    program: "npx".to_string(),
                    reason: "exit code 1: ccusage blew up".to_string(),
                })
            },
        ),
        store.clone(),
    );
    let (_handle, mut rx) = watch(engine);

    let (snapshot, status) = next_outcome(&mut rx).await;
    assert_eq!(snapshot.block_total_tokens, 0);
    assert!((snapshot.indicator_percent - 63.0).abs() < f64::EPSILON);
    assert!(status.starts_with("Updated: "), "status: {status}");
}

#[tokio::test]
async fn cycle_driven_by_parsed_blocks_listing() {
    // Token counts extracted from a realistic `ccusage blocks --json`
    // document, fed through a full cycle.
    let report: BlocksReport = serde_json::from_str(sample_blocks_json()).expect("report");
    let counts = active_counts(&report.blocks);

    let (_dir, store) = temp_state_store();
    let engine = Engine::with_parts(
        ScriptedSources::new(move || Ok(42.5), move || Ok(counts)),
        store.clone(),
    );
    let (_handle, mut rx) = watch(engine);

    let (snapshot, _) = next_outcome(&mut rx).await;
    assert_eq!(snapshot.input_tokens_used, 1000);
    assert_eq!(snapshot.output_tokens_used, 200);
    assert_eq!(snapshot.block_total_tokens, 1500);
    assert!((snapshot.indicator_percent - 42.5).abs() < f64::EPSILON);
}

#[tokio::test]
async fn settings_round_trip_through_the_handle() {
    let (_dir, store) = temp_state_store();
    let engine = Engine::with_parts(
        ScriptedSources::new(|| Ok(1.0), || Ok(TokenCounts::default())),
        store.clone(),
    );
    let (handle, mut rx) = watch(engine);
    let _ = next_outcome(&mut rx).await;

    let mut settings = handle.settings();
    settings.pinned_on_top = true;
    settings.refresh_interval = Duration::from_secs(300);
    handle.set_settings(settings).expect("settings persist");

    assert_eq!(handle.settings(), settings);
    // Settings and snapshot live in one record; both survive together.
    let reloaded = store.load();
    assert_eq!(reloaded.settings(), settings);
}
