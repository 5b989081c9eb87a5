//! Core engine: usage sources, reconciliation, and scheduling.

pub mod blocks;
pub mod cli_runner;
pub mod credentials;
pub mod doctor;
pub mod engine;
pub mod http;
pub mod logging;
pub mod models;
pub mod oauth;
pub mod reconcile;

pub use engine::{Engine, EngineHandle, LiveSources, UsageSources};
pub use models::{DEFAULT_REFRESH, MIN_REFRESH, Settings, TokenCounts, UsageSnapshot};
