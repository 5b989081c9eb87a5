//! Startup dependency check.
//!
//! Verifies the external tools the refresh cycle depends on and produces a
//! single user-facing status line: the first failing check's guidance, or
//! the ready message. Runs once, off the presentation thread.

use crate::core::cli_runner::run_command;

/// Status when every dependency checks out.
pub const READY: &str = "Ready — click Refresh";

/// Guidance when the Node.js launcher is missing.
pub const NPX_MISSING: &str = "Node.js/npm not found. Install Node.js first.";

/// Guidance when the accounting tool cannot run.
pub const CCUSAGE_MISSING: &str = "ccusage not found. Run: npm i -g ccusage";

/// Guidance when the Claude CLI has no login session.
pub const NOT_LOGGED_IN: &str = "Claude CLI not logged in. Run: claude auth login";

/// Run the dependency checks in order, returning the first failure's
/// guidance or [`READY`].
pub async fn check_dependencies() -> String {
    if which::which("npx").is_err() {
        tracing::warn!("npx not found on PATH");
        return NPX_MISSING.to_string();
    }

    match run_command("npx", &["--yes", "ccusage@latest", "--version"], None).await {
        Ok(output) if output.success() => {}
        _ => {
            tracing::warn!("ccusage --version failed");
            return CCUSAGE_MISSING.to_string();
        }
    }

    match run_command("claude", &["auth", "status"], None).await {
        Ok(output) if output.success() && output.stdout.contains("loggedIn") => {}
        _ => {
            tracing::warn!("claude auth status did not report a login");
            return NOT_LOGGED_IN.to_string();
        }
    }

    READY.to_string()
}
