//! Runtime configuration loading.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use vigil_error::{ConfigError, VigilResult};

/// Runtime settings with sensible defaults.
///
/// Loaded from a TOML file with `.env` hydration for deployments that keep
/// the data directory in the environment. Every field has a default, so an
/// absent file yields a working ephemeral configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Getters)]
pub struct VigilConfig {
    /// Directory holding the ledger, event log, and task table.
    #[serde(default = "default_data_dir")]
    data_dir: PathBuf,

    /// Default armed-window length in minutes.
    #[serde(default = "default_arm_minutes")]
    default_arm_minutes: i64,

    /// Expiry watcher tick interval in seconds.
    #[serde(default = "default_expiry_tick_seconds")]
    expiry_tick_seconds: u64,

    /// Persist state to disk; false keeps everything in memory.
    #[serde(default = "default_persist_state")]
    persist_state: bool,

    /// Restore pending tasks from the task store at startup.
    #[serde(default = "default_restore_tasks")]
    restore_tasks: bool,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_arm_minutes() -> i64 {
    10
}

fn default_expiry_tick_seconds() -> u64 {
    30
}

fn default_persist_state() -> bool {
    true
}

fn default_restore_tasks() -> bool {
    true
}

impl Default for VigilConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            default_arm_minutes: default_arm_minutes(),
            expiry_tick_seconds: default_expiry_tick_seconds(),
            persist_state: default_persist_state(),
            restore_tasks: default_restore_tasks(),
        }
    }
}

impl VigilConfig {
    /// Load configuration from a TOML file.
    ///
    /// Hydrates `.env` first (ignored if absent), then applies the
    /// `VIGIL_DATA_DIR` environment override on top of the file. A missing
    /// file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed.
    #[tracing::instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load<P: AsRef<Path>>(path: P) -> VigilResult<Self> {
        dotenvy::dotenv().ok();
        let path = path.as_ref();

        let mut config = if path.exists() {
            let contents = fs::read_to_string(path).map_err(|e| {
                ConfigError::new(format!("{}: {}", path.display(), e))
            })?;
            toml::from_str(&contents)
                .map_err(|e| ConfigError::new(format!("{}: {}", path.display(), e)))?
        } else {
            tracing::debug!("No config file; using defaults");
            Self::default()
        };

        if let Ok(data_dir) = std::env::var("VIGIL_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        tracing::info!(
            data_dir = %config.data_dir.display(),
            persist_state = config.persist_state,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Validate configuration.
    ///
    /// # Returns
    ///
    /// List of validation warnings (empty if valid).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.default_arm_minutes <= 0 {
            warnings.push(format!(
                "default_arm_minutes is {}; every ARM command will be rejected",
                self.default_arm_minutes
            ));
        }

        if self.expiry_tick_seconds == 0 {
            warnings.push("expiry_tick_seconds is 0, watcher will busy-loop".to_string());
        } else if self.expiry_tick_seconds > 300 {
            warnings.push(format!(
                "expiry_tick_seconds is {}; stale consent may linger that long",
                self.expiry_tick_seconds
            ));
        }

        if !self.persist_state && self.restore_tasks {
            warnings.push(
                "restore_tasks has no effect without persist_state".to_string(),
            );
        }

        tracing::debug!(warnings = warnings.len(), "Configuration validated");
        warnings
    }

    /// Path of the consent ledger file.
    pub fn ledger_path(&self) -> PathBuf {
        self.data_dir.join("consent_ledger.jsonl")
    }

    /// Path of the event log file.
    pub fn events_path(&self) -> PathBuf {
        self.data_dir.join("events.jsonl")
    }

    /// Path of the task table file.
    pub fn tasks_path(&self) -> PathBuf {
        self.data_dir.join("tasks.json")
    }
}
