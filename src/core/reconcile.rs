//! Merges the two usage sources into one authoritative snapshot.
//!
//! The primary source owns the percentage dimension, the secondary owns
//! token counts; the two are never cross-computed. Either source may fail
//! without failing the cycle; only both failing is surfaced.

use chrono::Local;

use crate::core::models::{TokenCounts, UsageSnapshot};
use crate::error::{Result, WidgetError};

/// Combine the sources' results.
///
/// `previous_percent` fills the percentage slot when only the secondary
/// source succeeded; no percent is available that cycle and the last known
/// one stands.
///
/// # Errors
///
/// [`WidgetError::BothSourcesFailed`] when neither source produced a
/// usable result.
pub fn reconcile(
    primary: Result<f64>,
    secondary: Result<TokenCounts>,
    previous_percent: f64,
) -> Result<UsageSnapshot> {
    match (primary, secondary) {
        (Ok(percent), Ok(counts)) => Ok(UsageSnapshot::from_counts(counts, percent)),
        (Ok(percent), Err(err)) => {
            tracing::warn!(error = %err, "secondary source failed, token detail zeroed");
            Ok(UsageSnapshot::from_counts(TokenCounts::default(), percent))
        }
        (Err(err), Ok(counts)) => {
            tracing::warn!(error = %err, "primary source failed, keeping previous percent");
            Ok(UsageSnapshot::from_counts(counts, previous_percent))
        }
        (Err(primary), Err(secondary)) => Err(WidgetError::BothSourcesFailed {
            primary: Box::new(primary),
            secondary: Box::new(secondary),
        }),
    }
}

/// Status line for a successful cycle, e.g. `Updated: 15:04:05`.
#[must_use]
pub fn updated_message() -> String {
    format!("Updated: {}", Local::now().format("%H:%M:%S"))
}

/// Status line for a failed cycle.
///
/// Credential-kind failures normalize to one consistent message no matter
/// which sub-error produced them; everything else surfaces its own text.
#[must_use]
pub fn failure_message(err: &WidgetError) -> String {
    let surfaced = err.surfaced();
    if surfaced.is_credential_kind() {
        "Error: Claude not logged in".to_string()
    } else {
        format!("Error: {surfaced}")
    }
}
