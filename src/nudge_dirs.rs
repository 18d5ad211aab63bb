//! Centralized application directory paths for tasknudge.
//!
//! Uses the [`dirs`] crate for platform-appropriate directory resolution.
//!
//! # Directory Layout
//!
//! | Purpose | macOS | Linux |
//! |---------|-------|-------|
//! | App data | `~/Library/Application Support/tasknudge/` | `~/.local/share/tasknudge/` |
//! | Config | `~/Library/Application Support/tasknudge/` | `~/.config/tasknudge/` |
//!
//! # Environment Overrides
//!
//! - `TASKNUDGE_DATA_DIR` overrides [`data_dir`]
//! - `TASKNUDGE_CONFIG_DIR` overrides [`config_dir`]

use std::path::PathBuf;

/// Application data root directory.
///
/// Holds the task store, CSV exports and log files.
#[must_use]
pub fn data_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("TASKNUDGE_DATA_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::data_dir()
        .map(|d| d.join("tasknudge"))
        .unwrap_or_else(|| PathBuf::from("/tmp/tasknudge-data"))
}

/// Application config directory.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("TASKNUDGE_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join("tasknudge"))
        .unwrap_or_else(|| PathBuf::from("/tmp/tasknudge-config"))
}

/// Log file directory (`data_dir()/logs/`).
#[must_use]
pub fn logs_dir() -> PathBuf {
    data_dir().join("logs")
}

/// Main config file path (`config_dir()/config.toml`).
#[must_use]
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Task store path (`data_dir()/tasks.json`).
#[must_use]
pub fn tasks_file() -> PathBuf {
    data_dir().join("tasks.json")
}

/// Default CSV export path (`data_dir()/tasks.csv`).
#[must_use]
pub fn export_file() -> PathBuf {
    data_dir().join("tasks.csv")
}
