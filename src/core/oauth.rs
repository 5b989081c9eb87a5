//! Primary usage source: the Anthropic OAuth usage endpoint.
//!
//! Reports the authoritative utilization percentage for the current
//! five-hour quota window. One authenticated request per refresh cycle,
//! bounded by [`crate::core::http::OAUTH_TIMEOUT`], with no retry inside
//! the call.

use reqwest::Client;
use serde::Deserialize;

use crate::core::credentials::Credential;
use crate::core::http::OAUTH_TIMEOUT;
use crate::error::{Result, WidgetError};

/// Usage endpoint queried once per refresh cycle.
pub const USAGE_URL: &str = "https://api.anthropic.com/api/oauth/usage";

/// Feature-flag header required by the endpoint.
const BETA_HEADER: &str = "oauth-2025-04-20";

/// Response body of the usage endpoint.
#[derive(Debug, Deserialize)]
struct UsageResponse {
    #[serde(default)]
    five_hour: Option<QuotaWindow>,
}

/// Utilization of the current quota window. `resets_at` is part of the wire
/// contract but unused here.
#[derive(Debug, Deserialize)]
struct QuotaWindow {
    #[serde(default)]
    utilization: f64,
    #[allow(dead_code)]
    #[serde(default)]
    resets_at: Option<String>,
}

/// Fetch the utilization percentage for the current quota window.
///
/// # Errors
///
/// - [`WidgetError::Network`] / [`WidgetError::Timeout`] on transport
///   failure
/// - [`WidgetError::HttpStatus`] for any non-success status
/// - [`WidgetError::ParseResponse`] if the body cannot be decoded
/// - [`WidgetError::MissingUsageWindow`] if the decoded body has no
///   `five_hour` field at all (a present field with utilization 0 succeeds)
pub async fn fetch_utilization(client: &Client, credential: &Credential) -> Result<f64> {
    fetch_utilization_from(client, USAGE_URL, credential).await
}

/// Same as [`fetch_utilization`], against an explicit endpoint.
///
/// # Errors
///
/// See [`fetch_utilization`].
pub async fn fetch_utilization_from(
    client: &Client,
    url: &str,
    credential: &Credential,
) -> Result<f64> {
    let response = client
        .get(url)
        .header(
            "Authorization",
            format!("Bearer {}", credential.access_token),
        )
        .header("anthropic-beta", BETA_HEADER)
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                WidgetError::Timeout(OAUTH_TIMEOUT.as_secs())
            } else {
                WidgetError::Network(e.to_string())
            }
        })?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| WidgetError::Network(e.to_string()))?;

    if !status.is_success() {
        return Err(WidgetError::HttpStatus {
            status: status.as_u16(),
            body,
        });
    }

    let usage: UsageResponse =
        serde_json::from_str(&body).map_err(|e| WidgetError::ParseResponse(e.to_string()))?;

    usage
        .five_hour
        .map(|window| window.utilization)
        .ok_or(WidgetError::MissingUsageWindow)
}
