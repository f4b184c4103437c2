//! Engine configuration loaded from TOML.
//!
//! Every field has a default, so an empty document (or no document at all)
//! yields the board's stock behaviour.

use crate::board::domain::WipLimits;
use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use serde::{Deserialize, Serialize};
use std::io;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_TICK_INTERVAL_MS: u64 = 1_000;
const DEFAULT_AUTO_ENTRY_DESCRIPTION: &str = "Time recorded automatically";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file '{path}': {source}")]
    Read {
        /// File that was requested.
        path: String,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The document is not valid TOML for [`WorkboardConfig`].
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Storage keys for the three persisted documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageKeys {
    /// Key of the task list.
    pub tasks: String,
    /// Key of the time entry log.
    pub time_entries: String,
    /// Key of the live timer session.
    pub timer_session: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            tasks: "projectflow_tasks".to_owned(),
            time_entries: "projectflow_time_entries".to_owned(),
            timer_session: "projectflow_timer_session".to_owned(),
        }
    }
}

/// Engine configuration.
///
/// ```toml
/// tick_interval_ms = 500
///
/// [wip_limits]
/// review = 2
///
/// [storage]
/// tasks = "team_tasks"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkboardConfig {
    /// Per-column capacity.
    pub wip_limits: WipLimits,
    /// Period of elapsed-time ticks in milliseconds.
    pub tick_interval_ms: u64,
    /// Persistence keys.
    pub storage: StorageKeys,
    /// Description of timer entries whose session carries no note.
    pub auto_entry_description: String,
}

impl Default for WorkboardConfig {
    fn default() -> Self {
        Self {
            wip_limits: WipLimits::default(),
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            storage: StorageKeys::default(),
            auto_entry_description: DEFAULT_AUTO_ENTRY_DESCRIPTION.to_owned(),
        }
    }
}

impl WorkboardConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] for a zero tick interval or a blank storage
    /// key.
    pub fn from_toml_str(document: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(document)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses the TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file cannot be read, otherwise
    /// as [`Self::from_toml_str`].
    pub fn from_file(path: &Utf8Path) -> Result<Self, ConfigError> {
        let read_error = |source: io::Error| ConfigError::Read {
            path: path.to_string(),
            source,
        };
        let parent = path
            .parent()
            .filter(|dir| !dir.as_str().is_empty())
            .unwrap_or_else(|| Utf8Path::new("."));
        let name = path.file_name().ok_or_else(|| {
            read_error(io::Error::new(
                io::ErrorKind::InvalidInput,
                "path has no file name",
            ))
        })?;
        let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(read_error)?;
        let document = dir.read_to_string(name).map_err(read_error)?;
        Self::from_toml_str(&document)
    }

    /// Returns the elapsed-time tick period.
    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "tick_interval_ms must be positive".to_owned(),
            ));
        }
        let keys = [
            &self.storage.tasks,
            &self.storage.time_entries,
            &self.storage.timer_session,
        ];
        if keys.iter().any(|key| key.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "storage keys must not be blank".to_owned(),
            ));
        }
        Ok(())
    }
}
