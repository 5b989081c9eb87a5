//! Per-user application data locations.

use std::path::PathBuf;

/// Directory holding the persisted widget state.
///
/// `%APPDATA%\ClaudeTokenWidget` when `APPDATA` is set (Windows), otherwise
/// `~/.claude-token-widget`.
#[must_use]
pub fn app_data_dir() -> PathBuf {
    if let Ok(appdata) = std::env::var("APPDATA") {
        if !appdata.is_empty() {
            return PathBuf::from(appdata).join("ClaudeTokenWidget");
        }
    }
    let home = directories::BaseDirs::new()
        .map_or_else(|| PathBuf::from("."), |d| d.home_dir().to_path_buf());
    home.join(".claude-token-widget")
}

/// Path of the persisted settings + snapshot record.
#[must_use]
pub fn state_file() -> PathBuf {
    app_data_dir().join("config.json")
}
