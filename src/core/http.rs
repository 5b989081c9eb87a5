//! HTTP client utilities.
//!
//! Provides the configured `reqwest` client used by the primary usage
//! source.

use std::time::Duration;

use reqwest::{Client, ClientBuilder};

use crate::error::{Result, WidgetError};

/// Timeout for the OAuth usage endpoint. The accounting subprocess has no
/// such bound; see `core::cli_runner`.
pub const OAUTH_TIMEOUT: Duration = Duration::from_secs(10);

/// Client identification header sent with every usage request.
pub const USER_AGENT: &str = "claude-code/2.0.32";

/// Build a configured HTTP client.
///
/// # Errors
///
/// Returns error if client construction fails.
pub fn build_client(timeout: Duration) -> Result<Client> {
    ClientBuilder::new()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| WidgetError::Network(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_client_succeeds() {
        assert!(build_client(OAUTH_TIMEOUT).is_ok());
        assert!(build_client(Duration::from_secs(0)).is_ok());
    }
}
