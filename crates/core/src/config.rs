// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Profiler configuration.
//!
//! Defaults, then an optional TOML file, then `QP_*` environment overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Name of the shared control file inside the log directory.
pub const CONTROL_FILE_NAME: &str = "jobs.json";

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

/// Recognized profiler options.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfilerConfig {
    /// Master switch; nothing is read or written when off.
    pub enabled: bool,
    /// Directory holding the control file and per-job logs.
    pub log_dir: PathBuf,
    /// Also write the human-readable `.raw.log` file.
    pub raw_log: bool,
    /// Seconds between control-file re-reads.
    pub job_check_interval: u64,
    /// Maximum captured frames; 0 disables trace capture.
    pub trace_depth: usize,
    /// Slow-query breakpoint threshold in seconds; 0 or less disables it.
    pub slow_query_threshold: f64,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_dir: std::env::temp_dir().join("mariadb_profiler"),
            raw_log: true,
            job_check_interval: 1,
            trace_depth: 0,
            slow_query_threshold: 0.0,
        }
    }
}

impl ProfilerConfig {
    /// Parse a TOML document; missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load from a TOML file, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let mut config = Self::from_toml_str(&text)?;
        config.apply_env()?;
        Ok(config)
    }

    /// Defaults plus environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Override fields from `QP_*` environment variables.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(v) = var("QP_ENABLED") {
            self.enabled = parse_bool("QP_ENABLED", &v)?;
        }
        if let Some(v) = var("QP_LOG_DIR").filter(|v| !v.is_empty()) {
            self.log_dir = PathBuf::from(v);
        }
        if let Some(v) = var("QP_RAW_LOG") {
            self.raw_log = parse_bool("QP_RAW_LOG", &v)?;
        }
        if let Some(v) = var("QP_JOB_CHECK_INTERVAL") {
            self.job_check_interval = parse_num("QP_JOB_CHECK_INTERVAL", &v)?;
        }
        if let Some(v) = var("QP_TRACE_DEPTH") {
            self.trace_depth = parse_num("QP_TRACE_DEPTH", &v)?;
        }
        if let Some(v) = var("QP_SLOW_QUERY_THRESHOLD") {
            self.slow_query_threshold = parse_num("QP_SLOW_QUERY_THRESHOLD", &v)?;
        }
        Ok(())
    }

    /// Path of the shared control file.
    pub fn control_file_path(&self) -> PathBuf {
        self.log_dir.join(CONTROL_FILE_NAME)
    }

    pub fn job_check_interval(&self) -> Duration {
        Duration::from_secs(self.job_check_interval)
    }

    /// Slow-query threshold in milliseconds, `None` when disabled.
    pub fn slow_query_threshold_ms(&self) -> Option<f64> {
        if self.slow_query_threshold.is_finite() && self.slow_query_threshold > 0.0 {
            Some(self.slow_query_threshold * 1000.0)
        } else {
            None
        }
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue { key, value: value.to_string() }),
    }
}

fn parse_num<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { key, value: value.to_string() })
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
