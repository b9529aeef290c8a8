//! TOML-based application configuration.
//!
//! Stored at `<config_dir>/config.toml`. Both keys are optional human-time
//! strings (`25m`, `1h30m`); missing keys fall back to the defaults and
//! unknown keys are ignored.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::session::SessionKind;
use crate::storage::config_dir;

/// Runtime configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default length of a focus session.
    #[serde(with = "humantime_serde")]
    pub focus_duration: Duration,
    /// Default length of a break session.
    #[serde(with = "humantime_serde")]
    pub break_duration: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            focus_duration: Duration::from_secs(25 * 60),
            break_duration: Duration::from_secs(5 * 60),
        }
    }
}

impl Config {
    /// The configuration file path, `<config_dir>/config.toml`.
    pub fn path() -> PathBuf {
        config_dir().join("config.toml")
    }

    /// Load from the default path; a missing or unreadable file yields the
    /// defaults. Configuration never fails a command.
    pub fn load_or_default() -> Self {
        Self::load_from(&Self::path()).unwrap_or_default()
    }

    /// Load and parse the file at `path`.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The default session length for `kind`.
    pub fn default_duration(&self, kind: SessionKind) -> Duration {
        match kind {
            SessionKind::Focus => self.focus_duration,
            SessionKind::Break => self.break_duration,
        }
    }
}

mod humantime_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
