//! Trail Configuration

use std::fs;
use std::path::Path;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::model::{ConfigError, ConfigResult};
use crate::observability::Severity;
use crate::reify::DEFAULT_HAS_ONE_LOOKBACK_SECS;

/// Longest accepted `has_one` lookback: one year.
pub const MAX_HAS_ONE_LOOKBACK_SECS: i64 = 365 * 24 * 60 * 60;

/// Process-level trail configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrailConfig {
    /// Capture versions at all (default: true)
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Record changesets when the store supports them (default: true)
    #[serde(default = "default_track_object_changes")]
    pub track_object_changes: bool,

    /// Lookback for `has_one` reification in seconds (default: 3)
    #[serde(default = "default_has_one_lookback_secs")]
    pub has_one_lookback_secs: i64,

    /// Minimum log severity (default: "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_enabled() -> bool {
    true
}

fn default_track_object_changes() -> bool {
    true
}

fn default_has_one_lookback_secs() -> i64 {
    DEFAULT_HAS_ONE_LOOKBACK_SECS
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            track_object_changes: default_track_object_changes(),
            has_one_lookback_secs: default_has_one_lookback_secs(),
            log_level: default_log_level(),
        }
    }
}

impl TrailConfig {
    /// Read and validate a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .map_err(|e| ConfigError::Unreadable(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&raw)
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json(raw: &str) -> ConfigResult<Self> {
        let config: Self =
            serde_json::from_str(raw).map_err(|e| ConfigError::Unreadable(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.has_one_lookback_secs < 0 {
            return Err(ConfigError::InvalidSetting {
                field: "has_one_lookback_secs",
                reason: "must not be negative".to_string(),
            });
        }
        if self.has_one_lookback_secs > MAX_HAS_ONE_LOOKBACK_SECS {
            return Err(ConfigError::InvalidSetting {
                field: "has_one_lookback_secs",
                reason: format!("must not exceed {}", MAX_HAS_ONE_LOOKBACK_SECS),
            });
        }
        self.severity()?;
        Ok(())
    }

    /// The configured minimum log severity.
    pub fn severity(&self) -> ConfigResult<Severity> {
        self.log_level
            .parse()
            .map_err(|reason| ConfigError::InvalidSetting {
                field: "log_level",
                reason,
            })
    }

    /// The lookback as a duration, clamped to the accepted range.
    pub fn has_one_lookback(&self) -> Duration {
        Duration::seconds(
            self.has_one_lookback_secs
                .clamp(0, MAX_HAS_ONE_LOOKBACK_SECS),
        )
    }
}
