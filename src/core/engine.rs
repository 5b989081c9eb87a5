//! Refresh scheduling and shared-state ownership.
//!
//! Every refresh trigger (startup, timer, manual) funnels through one
//! bounded channel into a single worker task, so at most one
//! fetch-reconcile-persist-publish cycle is in flight at a time. The shared
//! settings + snapshot record lives behind one mutex, held only across
//! read-modify-write and the local file save, never across network or
//! subprocess calls. Collaborators receive owned snapshot copies, safe to
//! hand across thread boundaries.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;

use crate::core::blocks;
use crate::core::credentials::CredentialStore;
use crate::core::doctor;
use crate::core::http::{OAUTH_TIMEOUT, build_client};
use crate::core::models::{MIN_REFRESH, Settings, TokenCounts, UsageSnapshot};
use crate::core::oauth;
use crate::core::reconcile::{failure_message, reconcile, updated_message};
use crate::error::Result;
use crate::storage::state::{PersistedState, StateStore};

/// Status published at the start of every cycle.
pub const REFRESHING: &str = "Refreshing…";

/// Why a refresh cycle was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Startup,
    Manual,
    Timer,
}

/// The two usage sources, abstracted so tests can script them.
pub trait UsageSources: Send + Sync + 'static {
    /// Authoritative utilization percentage for the current quota window.
    fn primary(&self) -> impl Future<Output = Result<f64>> + Send;

    /// Token counts for the active usage window.
    fn secondary(&self) -> impl Future<Output = Result<TokenCounts>> + Send;
}

/// Production sources: the OAuth usage endpoint plus the `ccusage`
/// subprocess.
pub struct LiveSources {
    credentials: CredentialStore,
    subprocess_timeout: Option<Duration>,
}

impl LiveSources {
    /// Sources over the default credential location, subprocess unbounded.
    #[must_use]
    pub fn new() -> Self {
        Self {
            credentials: CredentialStore::new(),
            subprocess_timeout: None,
        }
    }

    /// Read credentials from a non-default location.
    #[must_use]
    pub fn with_credentials(mut self, store: CredentialStore) -> Self {
        self.credentials = store;
        self
    }

    /// Bound the accounting subprocess. The HTTP call always carries a
    /// fixed timeout while this one defaults to none; the asymmetry is
    /// inherited behavior, configurable only here.
    #[must_use]
    pub const fn with_subprocess_timeout(mut self, timeout: Duration) -> Self {
        self.subprocess_timeout = Some(timeout);
        self
    }
}

impl Default for LiveSources {
    fn default() -> Self {
        Self::new()
    }
}

impl UsageSources for LiveSources {
    async fn primary(&self) -> Result<f64> {
        // Credentials are re-read on every fetch; a login between cycles is
        // picked up without a restart.
        let credential = self.credentials.load()?;
        let client = build_client(OAUTH_TIMEOUT)?;
        oauth::fetch_utilization(&client, &credential).await
    }

    async fn secondary(&self) -> Result<TokenCounts> {
        blocks::fetch_blocks(self.subprocess_timeout).await
    }
}

type SnapshotCallback = Box<dyn Fn(UsageSnapshot, &str) + Send + Sync>;
type DependencyCallback = Box<dyn FnOnce(String) + Send>;

/// The usage engine, before its background tasks are started.
pub struct Engine<S: UsageSources> {
    sources: Arc<S>,
    store: StateStore,
    state: Arc<Mutex<PersistedState>>,
    on_snapshot: Option<SnapshotCallback>,
    on_dependency_check: Option<DependencyCallback>,
}

impl Engine<LiveSources> {
    /// Engine over the production sources and the default state location.
    #[must_use]
    pub fn new() -> Self {
        Self::with_parts(LiveSources::new(), StateStore::new())
    }
}

impl Default for Engine<LiveSources> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: UsageSources> Engine<S> {
    /// Engine over explicit sources and storage (tests, embedding).
    ///
    /// The persisted record is loaded here; a below-floor interval has
    /// already self-healed by the time the timer first reads it.
    #[must_use]
    pub fn with_parts(sources: S, store: StateStore) -> Self {
        let state = store.load();
        Self {
            sources: Arc::new(sources),
            store,
            state: Arc::new(Mutex::new(state)),
            on_snapshot: None,
            on_dependency_check: None,
        }
    }

    /// Register the snapshot callback the presentation shell renders from.
    ///
    /// Fired with [`REFRESHING`] when a cycle starts and with the outcome
    /// status when it ends. The snapshot argument is an owned copy.
    #[must_use]
    pub fn on_snapshot_updated(
        mut self,
        callback: impl Fn(UsageSnapshot, &str) + Send + Sync + 'static,
    ) -> Self {
        self.on_snapshot = Some(Box::new(callback));
        self
    }

    /// Register the one-shot startup dependency-check callback.
    #[must_use]
    pub fn on_startup_dependency_check(
        mut self,
        callback: impl FnOnce(String) + Send + 'static,
    ) -> Self {
        self.on_dependency_check = Some(Box::new(callback));
        self
    }

    /// Start the background tasks and return the collaborator handle.
    ///
    /// Must be called within a tokio runtime. One immediate fetch is queued
    /// before the timer loop begins. Dropping every handle closes the
    /// trigger channel; the worker finishes its current cycle and stops.
    #[must_use = "dropping every handle stops the engine"]
    pub fn start(self) -> EngineHandle {
        let (tx, mut rx) = mpsc::channel::<Trigger>(1);

        // Queued before the worker begins waiting, so the first cycle runs
        // without waiting out a full interval.
        let _ = tx.try_send(Trigger::Startup);

        if let Some(callback) = self.on_dependency_check {
            tokio::spawn(async move {
                callback(doctor::check_dependencies().await);
            });
        }

        let handle = EngineHandle {
            tx,
            state: Arc::clone(&self.state),
            store: self.store.clone(),
        };

        let sources = self.sources;
        let store = self.store;
        let state = self.state;
        let publish = self.on_snapshot;

        tokio::spawn(async move {
            loop {
                let interval = lock(&state).refresh_interval;
                let trigger = match tokio::time::timeout(interval, rx.recv()).await {
                    Ok(Some(trigger)) => trigger,
                    Ok(None) => break,
                    Err(_) => Trigger::Timer,
                };
                run_cycle(trigger, sources.as_ref(), &store, &state, publish.as_deref()).await;
            }
            tracing::debug!("engine worker stopped");
        });

        handle
    }
}

/// Handle the presentation shell drives the engine with. Clones share the
/// one engine.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<Trigger>,
    state: Arc<Mutex<PersistedState>>,
    store: StateStore,
}

impl EngineHandle {
    /// Request an on-demand refresh.
    ///
    /// Returns `false` when a refresh is already pending; the request
    /// coalesces with it rather than queueing another cycle.
    pub fn trigger_manual_refresh(&self) -> bool {
        self.tx.try_send(Trigger::Manual).is_ok()
    }

    /// Current settings, as an owned copy.
    #[must_use]
    pub fn settings(&self) -> Settings {
        lock(&self.state).settings()
    }

    /// Latest reconciled snapshot, as an owned copy.
    #[must_use]
    pub fn snapshot(&self) -> UsageSnapshot {
        lock(&self.state).snapshot()
    }

    /// Apply and persist new settings.
    ///
    /// An interval below the floor is raised to it. The new interval takes
    /// effect when the timer next arms itself.
    ///
    /// # Errors
    ///
    /// Returns error when the record cannot be written.
    pub fn set_settings(&self, settings: Settings) -> Result<()> {
        let clamped = Settings {
            refresh_interval: settings.refresh_interval.max(MIN_REFRESH),
            ..settings
        };
        let mut st = lock(&self.state);
        st.apply_settings(clamped);
        self.store.save(&st)
    }
}

/// One fetch-reconcile-persist-publish pass.
async fn run_cycle<S: UsageSources>(
    trigger: Trigger,
    sources: &S,
    store: &StateStore,
    state: &Mutex<PersistedState>,
    publish: Option<&(dyn Fn(UsageSnapshot, &str) + Send + Sync)>,
) {
    tracing::debug!(?trigger, "refresh cycle starting");

    let (previous_snapshot, previous_percent) = {
        let st = lock(state);
        (st.snapshot(), st.indicator_percent)
    };

    if let Some(callback) = publish {
        callback(previous_snapshot, REFRESHING);
    }

    // Both sources run concurrently; either may fail without aborting the
    // cycle. The lock is NOT held here.
    let (primary, secondary) = futures::join!(sources.primary(), sources.secondary());

    match reconcile(primary, secondary, previous_percent) {
        Ok(snapshot) => {
            {
                let mut st = lock(state);
                st.apply_snapshot(snapshot);
                if let Err(err) = store.save(&st) {
                    // A persistence hiccup must not break the refresh cycle.
                    tracing::warn!(error = %err, "failed to persist snapshot");
                }
            }
            tracing::info!(
                percent = snapshot.indicator_percent,
                total_tokens = snapshot.block_total_tokens,
                "refresh cycle complete"
            );
            if let Some(callback) = publish {
                callback(snapshot, &updated_message());
            }
        }
        Err(err) => {
            tracing::warn!(category = %err.category(), error = %err, "refresh cycle failed");
            if let Some(callback) = publish {
                callback(previous_snapshot, &failure_message(&err));
            }
        }
    }
}

fn lock(state: &Mutex<PersistedState>) -> MutexGuard<'_, PersistedState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
