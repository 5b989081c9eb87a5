//! tracing setup for the hosting shell.
//!
//! The engine only emits `tracing` events; the embedding widget calls
//! [`init`] once at startup. Level and format come from environment
//! variables so the shell needs no CLI surface:
//!
//! - `TOKEN_WIDGET_LOG`: filter directive, e.g. `debug` (default: `warn`)
//! - `TOKEN_WIDGET_LOG_FORMAT`: `human` | `json` | `compact` (default: `human`)

use tracing_subscriber::EnvFilter;

const LOG_LEVEL_ENV: &str = "TOKEN_WIDGET_LOG";
const LOG_FORMAT_ENV: &str = "TOKEN_WIDGET_LOG_FORMAT";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable logs.
    #[default]
    Human,
    /// JSON logs (one event per line).
    Json,
    /// Compact logs (single line, terse).
    Compact,
}

impl LogFormat {
    /// Parse from string (case-insensitive).
    #[must_use]
    pub fn from_arg(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "human" => Some(Self::Human),
            "json" => Some(Self::Json),
            "compact" => Some(Self::Compact),
            _ => None,
        }
    }

    fn from_env() -> Self {
        std::env::var(LOG_FORMAT_ENV)
            .ok()
            .and_then(|value| Self::from_arg(value.trim()))
            .unwrap_or_default()
    }
}

fn make_filter() -> EnvFilter {
    if let Ok(level) = std::env::var(LOG_LEVEL_ENV) {
        let trimmed = level.trim();
        if !trimmed.is_empty() {
            return EnvFilter::new(format!("token_widget={trimmed}"));
        }
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("token_widget=warn"))
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init() {
    match LogFormat::from_env() {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(make_filter())
                .json()
                .try_init()
                .ok();
        }
        LogFormat::Compact => {
            tracing_subscriber::fmt()
                .with_env_filter(make_filter())
                .compact()
                .with_target(true)
                .try_init()
                .ok();
        }
        LogFormat::Human => {
            tracing_subscriber::fmt()
                .with_env_filter(make_filter())
                .with_target(false)
                .without_time()
                .try_init()
                .ok();
        }
    }
}
