//! Platform-specific locations of GUI config files.
//!
//! - Linux: `~/.config/clasp/<plugin>.toml`
//! - macOS: `~/Library/Application Support/clasp/<plugin>.toml`
//! - Windows: `%APPDATA%\clasp\<plugin>.toml`

use std::path::PathBuf;

/// Application name used for directory paths.
const APP_NAME: &str = "clasp";

/// Returns the user-specific configuration directory.
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Path of the config file for `plugin` (e.g. `"clasp-demo"`).
///
/// Characters other than ASCII alphanumerics, `-`, `_` and `.` are replaced
/// with `_` so that CLAP ids like `com.example/gain` stay one file name.
pub fn gui_config_path(plugin: &str) -> PathBuf {
    user_config_dir().join(format!("{}.toml", sanitize(plugin)))
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
