//! Configuration types for KestrelDB

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Top-level configuration for the execution core
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct KestrelConfig {
    /// Operator execution settings
    #[serde(default)]
    pub execution: ExecutionConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl KestrelConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| Error::Config(e.to_string()))
    }

    /// Read and parse a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Validate the configuration and return any errors.
    pub fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.execution.slow_statement_threshold.is_zero() {
            errors.push("slow_statement_threshold must be > 0".to_string());
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            errors.push(format!(
                "logging.format must be \"text\" or \"json\", got {:?}",
                self.logging.format
            ));
        }

        if self.execution.update_buffer_limit == 0 {
            tracing::warn!("update_buffer_limit is 0; UPDATE buffering is unbounded");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Operator execution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Maximum number of records an UPDATE may buffer before writing (0 = unlimited)
    #[serde(default = "default_update_buffer_limit")]
    pub update_buffer_limit: usize,

    /// Statements running longer than this are logged at warn level
    #[serde(default = "default_slow_statement_threshold", with = "humantime_serde")]
    pub slow_statement_threshold: Duration,
}

fn default_update_buffer_limit() -> usize {
    1_000_000
}

fn default_slow_statement_threshold() -> Duration {
    Duration::from_secs(1)
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            update_buffer_limit: default_update_buffer_limit(),
            slow_statement_threshold: default_slow_statement_threshold(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or `EnvFilter` directive
    pub level: String,

    /// Log format (json or text)
    pub format: String,

    /// Log file path (None for stdout)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
            file: None,
        }
    }
}

/// Duration serialization helper
mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = humantime::format_duration(*duration).to_string();
        s.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
