//! Claude CLI credential file reader.
//!
//! Loads the bearer token issued by the Claude CLI login flow from
//! `~/.claude/.credentials.json`. The token is read fresh for every
//! primary-source fetch, never cached across cycles, and never persisted
//! or logged by this crate.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, WidgetError};

/// A bearer token for the OAuth usage endpoint. Transient and read-only.
#[derive(Debug, Clone)]
pub struct Credential {
    pub access_token: String,
}

/// On-disk shape of `~/.claude/.credentials.json`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CredentialsFile {
    #[serde(default)]
    claude_ai_oauth: Option<OauthSection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OauthSection {
    #[serde(default)]
    access_token: String,
}

/// Reader for the fixed credential file location.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Store reading from the default per-user location.
    #[must_use]
    pub fn new() -> Self {
        let home = directories::BaseDirs::new()
            .map_or_else(|| PathBuf::from("."), |d| d.home_dir().to_path_buf());
        Self {
            path: home.join(".claude").join(".credentials.json"),
        }
    }

    /// Store reading from an explicit path.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file this store reads.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the token. One attempt per call, no retry; the caller decides
    /// whether to try again on a later cycle.
    ///
    /// # Errors
    ///
    /// - [`WidgetError::CredentialsNotFound`] if the file is absent or
    ///   unreadable
    /// - [`WidgetError::CredentialsParse`] if the content is not the
    ///   expected JSON shape
    /// - [`WidgetError::CredentialsEmptyToken`] if the token field is
    ///   missing or empty
    pub fn load(&self) -> Result<Credential> {
        let data =
            std::fs::read_to_string(&self.path).map_err(|_| WidgetError::CredentialsNotFound {
                path: self.path.display().to_string(),
            })?;

        let parsed: CredentialsFile = serde_json::from_str(&data)
            .map_err(|e| WidgetError::CredentialsParse(e.to_string()))?;

        let access_token = parsed
            .claude_ai_oauth
            .map(|section| section.access_token)
            .unwrap_or_default();
        if access_token.is_empty() {
            return Err(WidgetError::CredentialsEmptyToken);
        }

        Ok(Credential { access_token })
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}
