//! Configuration structures for the clock bridge.
//!
//! Supports TOML deserialization with defaults that match the plain
//! pass-through behavior of the underlying system calls.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level bridge configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// What to do when a 64-bit time field does not fit the native width.
    pub narrowing: NarrowingPolicy,

    /// Install a counting `SIGALRM` handler before arming alarms, so an
    /// expiring alarm interrupts blocking calls instead of killing the process.
    pub handle_sigalrm: bool,

    /// Duration used by `nanosleep` when the caller gives none.
    #[serde(with = "humantime_serde")]
    pub default_nanosleep: Duration,

    /// Log level for the command-line front end.
    pub log_level: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            narrowing: NarrowingPolicy::Reject,
            handle_sigalrm: false,
            default_nanosleep: Duration::from_millis(1),
            log_level: "info".to_string(),
        }
    }
}

/// Policy for converting 64-bit fields into narrower native fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NarrowingPolicy {
    /// Fail the call before reaching the OS.
    #[default]
    Reject,
    /// Clamp to the nearest representable native value.
    Saturate,
}

impl BridgeConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error naming `path` if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Invalid {
            path: Some(path.to_path_buf()),
            source,
        })
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Invalid { path: None, source })
    }

    /// Render as TOML, e.g. to seed a config file.
    ///
    /// # Errors
    ///
    /// Returns the serializer's error.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Errors loading a bridge configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        /// File that was opened.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The content is not a valid bridge configuration.
    #[error("invalid configuration{}: {source}", location(.path))]
    Invalid {
        /// File the content came from, if any.
        path: Option<PathBuf>,
        /// Parser error.
        #[source]
        source: toml::de::Error,
    },
}

fn location(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!(" in {}", p.display()))
        .unwrap_or_default()
}

/// `Duration` fields written as humantime strings (`"250ms"`).
mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        humantime::Duration::from(*duration)
            .to_string()
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse::<humantime::Duration>()
            .map(Duration::from)
            .map_err(serde::de::Error::custom)
    }
}
