//! Configuration types for tasknudge.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NudgeConfig {
    /// Background due-scan settings.
    pub scheduler: SchedulerConfig,
    /// Task store settings.
    pub store: StoreConfig,
    /// Task intake (input parsing) settings.
    pub intake: IntakeConfig,
    /// CSV export settings.
    pub export: ExportConfig,
    /// Browser dashboard settings.
    pub dashboard: DashboardConfig,
    /// Log output settings.
    pub logging: LoggingConfig,
}

/// Background due-scan configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Seconds between scans while the scheduler is running.
    pub tick_interval_secs: u64,
    /// Start the scheduler automatically when a front-end launches.
    pub autostart: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 5,
            autostart: false,
        }
    }
}

impl SchedulerConfig {
    /// Tick interval as a [`std::time::Duration`], never shorter than one second.
    #[must_use]
    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.tick_interval_secs.max(1))
    }
}

/// Task store configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path of the JSON task store (None = `data_dir()/tasks.json`).
    pub path: Option<PathBuf>,
}

impl StoreConfig {
    /// Resolved store path.
    #[must_use]
    pub fn resolved_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(crate::nudge_dirs::tasks_file)
    }
}

/// Task intake configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    /// Reminder delay used when the requested delay is missing or not a number.
    pub default_delay_minutes: f64,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            default_delay_minutes: crate::intake::DEFAULT_DELAY_MINUTES,
        }
    }
}

/// CSV export configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Export destination (None = `data_dir()/tasks.csv`).
    pub path: Option<PathBuf>,
}

impl ExportConfig {
    /// Resolved export path.
    #[must_use]
    pub fn resolved_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(crate::nudge_dirs::export_file)
    }
}

/// Browser dashboard configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Number of recent alerts the dashboard keeps for display.
    pub recent_alert_limit: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8740,
            recent_alert_limit: 50,
        }
    }
}

/// Log output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Also write a daily-rolling log file under `data_dir()/logs/`.
    pub file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "tasknudge=info".to_owned(),
            file: false,
        }
    }
}

impl NudgeConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::error::NudgeError::Config(e.to_string()))
    }

    /// Load the config at `path` if given, else the default config file if it
    /// exists, else defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read or parsed.
    pub fn load_or_default(path: Option<&std::path::Path>) -> crate::error::Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        let default_path = Self::default_config_path();
        if default_path.exists() {
            Self::from_file(&default_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::NudgeError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `config_dir()/config.toml`.
    pub fn default_config_path() -> PathBuf {
        crate::nudge_dirs::config_file()
    }
}
