//! Error types for the usage engine.
//!
//! Uses `thiserror` for structured error types covering the whole taxonomy:
//! credential loading, the two usage sources, reconciliation, and
//! persistence. Individual source errors are caught at the reconciler
//! boundary and never abort a refresh cycle; only the combined
//! both-sources-failed condition reaches the user-facing status line, and
//! always as a short human-readable string, never a raw trace.

use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// High-level error categories for classification and routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Credential file missing, unreadable, unparseable, or empty token.
    Credential,
    /// Connection, timeout, or transport issues.
    Network,
    /// Usage-source responses that could not be used.
    Provider,
    /// Missing external tools.
    Environment,
    /// Internal errors (I/O, serialization, unclassified).
    Internal,
}

impl ErrorCategory {
    /// Returns a human-readable description of the category.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Credential => "Credential error",
            Self::Network => "Network error",
            Self::Provider => "Provider error",
            Self::Environment => "Environment error",
            Self::Internal => "Internal error",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

// =============================================================================
// Error Type
// =============================================================================

/// Main error type for the usage engine.
#[derive(Error, Debug)]
pub enum WidgetError {
    // ==========================================================================
    // Credential errors (Category: Credential)
    // ==========================================================================
    /// Credential file is absent or unreadable.
    #[error("cannot read credentials: {path}")]
    CredentialsNotFound { path: String },

    /// Credential file content is not the expected JSON shape.
    #[error("cannot parse credentials: {0}")]
    CredentialsParse(String),

    /// Token field is present but empty.
    #[error("no access token found")]
    CredentialsEmptyToken,

    // ==========================================================================
    // Primary source errors (Category: Network / Provider)
    // ==========================================================================
    /// Connection-level failure talking to the usage endpoint.
    #[error("API request failed: {0}")]
    Network(String),

    /// Request exceeded the fixed HTTP timeout.
    #[error("request timeout after {0} seconds")]
    Timeout(u64),

    /// Usage endpoint answered with a non-success status.
    #[error("API error {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// Response body or tool output could not be decoded.
    #[error("failed to parse response: {0}")]
    ParseResponse(String),

    /// Decoded response lacks the quota-window field entirely
    /// (distinct from the field being present with value 0).
    #[error("no five_hour data in response")]
    MissingUsageWindow,

    // ==========================================================================
    // Secondary source errors (Category: Environment / Provider)
    // ==========================================================================
    /// Accounting tool executable could not be located.
    #[error("command not found: {0}")]
    ToolNotFound(String),

    /// Accounting tool could not be started or exited non-zero.
    #[error("{program} failed: {reason}")]
    ProcessFailed { program: String, reason: String },

    // ==========================================================================
    // Reconciliation (Category: Provider)
    // ==========================================================================
    /// Neither source produced a usable result this cycle.
    #[error("both usage sources failed")]
    BothSourcesFailed {
        primary: Box<WidgetError>,
        secondary: Box<WidgetError>,
    },

    // ==========================================================================
    // Persistence (Category: Internal)
    // ==========================================================================
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ==========================================================================
    // Generic wrapper (Category: Internal)
    // ==========================================================================
    /// Catch-all for other errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl WidgetError {
    /// Returns the error category for classification and routing.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::CredentialsNotFound { .. }
            | Self::CredentialsParse(_)
            | Self::CredentialsEmptyToken => ErrorCategory::Credential,

            Self::Network(_) | Self::Timeout(_) => ErrorCategory::Network,

            Self::HttpStatus { .. }
            | Self::ParseResponse(_)
            | Self::MissingUsageWindow
            | Self::ProcessFailed { .. }
            | Self::BothSourcesFailed { .. } => ErrorCategory::Provider,

            Self::ToolNotFound(_) => ErrorCategory::Environment,

            Self::Io(_) | Self::Json(_) | Self::Other(_) => ErrorCategory::Internal,
        }
    }

    /// Whether this error means the user is not logged in to Claude.
    ///
    /// Drives the normalized status message: every credential-kind failure
    /// maps to the same user-facing text regardless of which sub-error
    /// produced it.
    #[must_use]
    pub const fn is_credential_kind(&self) -> bool {
        matches!(
            self,
            Self::CredentialsNotFound { .. }
                | Self::CredentialsParse(_)
                | Self::CredentialsEmptyToken
        )
    }

    /// The error whose text is surfaced to the user.
    ///
    /// For the combined failure this prefers the primary source's error
    /// unless its rendered message is empty, else the secondary's. Every
    /// other error surfaces itself.
    #[must_use]
    pub fn surfaced(&self) -> &Self {
        match self {
            Self::BothSourcesFailed { primary, secondary } => {
                if primary.to_string().is_empty() {
                    secondary
                } else {
                    primary
                }
            }
            other => other,
        }
    }
}

/// Result type alias for usage-engine operations.
pub type Result<T> = std::result::Result<T, WidgetError>;

// =============================================================================
// Tests
// =============================================================================
