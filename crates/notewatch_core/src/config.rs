//! Runtime configuration for the review cadence engine.
//!
//! # Responsibility
//! - Describe tunable engine constants (fallback interval, weekly scan bound,
//!   default fire time) plus logging and storage locations.
//! - Load and validate configuration from TOML.
//!
//! # Invariants
//! - Every field has a default; an empty document is a valid configuration.
//! - Defaults reproduce the documented engine behavior (12h fallback,
//!   14-day weekly scan, `09:00` default time).

use crate::logging::normalize_level;
use crate::model::cadence::TimeOfDay;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Fallback interval applied when a note has no usable cadence rule.
pub const DEFAULT_FALLBACK_INTERVAL_MINUTES: u32 = 12 * 60;
/// Upper bound of days scanned when resolving a weekly rule.
pub const DEFAULT_WEEKLY_SCAN_DAYS: u32 = 14;

const MIN_WEEKLY_SCAN_DAYS: u32 = 7;
const MAX_WEEKLY_SCAN_DAYS: u32 = 366;

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration loading/validation error.
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config toml: {err}"),
            Self::Invalid(message) => write!(f, "invalid config value: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

/// Tunables consumed by the recurrence calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Offset after the last review used when no rule applies.
    pub fallback_interval_minutes: u32,
    /// Days scanned forward for weekly rules before giving up.
    pub weekly_scan_days: u32,
    /// Fire time used when a calendar rule omits `time`.
    pub default_time: TimeOfDay,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            fallback_interval_minutes: DEFAULT_FALLBACK_INTERVAL_MINUTES,
            weekly_scan_days: DEFAULT_WEEKLY_SCAN_DAYS,
            default_time: TimeOfDay::DEFAULT,
        }
    }
}

impl ScheduleConfig {
    pub fn fallback_interval(&self) -> Duration {
        Duration::minutes(i64::from(self.fallback_interval_minutes))
    }

    fn validate(&self) -> ConfigResult<()> {
        if !(MIN_WEEKLY_SCAN_DAYS..=MAX_WEEKLY_SCAN_DAYS).contains(&self.weekly_scan_days) {
            return Err(ConfigError::Invalid(format!(
                "schedule.weekly_scan_days must be within {MIN_WEEKLY_SCAN_DAYS}..={MAX_WEEKLY_SCAN_DAYS}, got {}",
                self.weekly_scan_days
            )));
        }
        Ok(())
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotewatchConfig {
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Absolute directory for rolling logs; logging stays off when unset.
    pub log_dir: Option<PathBuf>,
    /// SQLite file backing the review ledger; in-memory when unset.
    pub database_path: Option<PathBuf>,
    pub schedule: ScheduleConfig,
}

impl Default for NotewatchConfig {
    fn default() -> Self {
        Self {
            log_level: crate::logging::default_log_level().to_string(),
            log_dir: None,
            database_path: None,
            schedule: ScheduleConfig::default(),
        }
    }
}

impl NotewatchConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(raw: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field constraints not expressible in serde.
    pub fn validate(&self) -> ConfigResult<()> {
        normalize_level(&self.log_level).map_err(ConfigError::Invalid)?;
        if let Some(dir) = &self.log_dir {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "log_dir must be an absolute path, got `{}`",
                    dir.display()
                )));
            }
        }
        self.schedule.validate()
    }
}

/// Reads and validates a TOML config file.
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<NotewatchConfig> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    NotewatchConfig::from_toml_str(&raw)
}
