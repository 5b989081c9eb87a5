//! token-widget - usage engine for a Claude token quota widget
//!
//! The acquisition and reconciliation core behind a small desktop widget
//! that tracks consumption of the rolling five-hour Claude token quota.
//! Two independent sources feed each refresh cycle: the Anthropic OAuth
//! usage endpoint (authoritative utilization percentage) and the `ccusage`
//! accounting tool (token counts for the active window). The engine merges
//! their possibly-partial results into one [`core::models::UsageSnapshot`],
//! persists it, and publishes it to the embedding presentation shell.
//!
//! Rendering, window management, and the settings dialog are the shell's
//! problem; this crate exposes the engine handle they drive.

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod core;
pub mod error;
pub mod storage;

/// Test utilities module - included in test builds or when test-utils feature is enabled.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use error::{Result, WidgetError};
