// Local configuration for the reconciliation engine.
//
// Global config: `~/.notarium/config.toml`. Scheduler tuning is
// expressed in milliseconds and clamped to sane ranges on conversion,
// so a bad hand-edit degrades instead of breaking.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::coalesce::SchedulerConfig;

/// Root directory for Notarium global state: `~/.notarium/`.
pub fn global_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".notarium"))
}

/// Path to the global config file: `~/.notarium/config.toml`.
pub fn global_config_path() -> Option<PathBuf> {
    global_dir().map(|d| d.join("config.toml"))
}

// ── Scheduler tuning ───────────────────────────────────────────────

const MIN_DEBOUNCE_MS: u64 = 250;
const MAX_DEBOUNCE_MS: u64 = 10_000;
const MIN_FLUSH_MS: u64 = 500;
const MAX_FLUSH_MS: u64 = 30_000;
const MIN_BATCH: usize = 1;
const MAX_BATCH: usize = 64;

/// Sync scheduler knobs as they appear in the config file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SyncTuning {
    pub debounce_ms: u64,
    pub flush_interval_ms: u64,
    pub retry_delay_ms: u64,
    pub max_batch_size: usize,
}

impl Default for SyncTuning {
    fn default() -> Self {
        let config = SchedulerConfig::default();
        Self {
            debounce_ms: config.debounce.as_millis() as u64,
            flush_interval_ms: config.flush_interval.as_millis() as u64,
            retry_delay_ms: config.retry_delay.as_millis() as u64,
            max_batch_size: config.max_batch_size,
        }
    }
}

impl SyncTuning {
    /// Convert to a runtime scheduler config, clamping each knob.
    pub fn to_scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            debounce: Duration::from_millis(
                self.debounce_ms.clamp(MIN_DEBOUNCE_MS, MAX_DEBOUNCE_MS),
            ),
            flush_interval: Duration::from_millis(
                self.flush_interval_ms.clamp(MIN_FLUSH_MS, MAX_FLUSH_MS),
            ),
            retry_delay: Duration::from_millis(
                self.retry_delay_ms.clamp(MIN_FLUSH_MS, MAX_FLUSH_MS),
            ),
            max_batch_size: self.max_batch_size.clamp(MIN_BATCH, MAX_BATCH),
        }
    }
}

// ── Engine config ──────────────────────────────────────────────────

/// Global engine configuration at `~/.notarium/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Search index sync scheduler tuning.
    pub sync: SyncTuning,
}

impl EngineConfig {
    /// Load from `~/.notarium/config.toml`. Returns defaults if the
    /// file doesn't exist or can't be parsed.
    pub fn load() -> Self {
        global_config_path().and_then(|p| Self::load_from(&p).ok()).unwrap_or_default()
    }

    /// Load from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Save to `~/.notarium/config.toml`.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = global_config_path().ok_or_else(|| {
            ConfigError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "could not determine home directory",
            ))
        })?;
        self.save_to(&path)
    }

    /// Save to a specific path (creates parent directories).
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

// ── Errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
