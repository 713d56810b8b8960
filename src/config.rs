//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::Deserialize;
use serde::de::Error;
use std::fs;
use std::path::Path;

use crate::error::{PollerError, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub poller: PollerConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub recorder: RecorderConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    /// Base URL all endpoints hang off, e.g. `http://127.0.0.1:8000/api`
    /// for a direct backend or `http://localhost:5000/api` behind a proxy.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    #[serde(default = "default_login_path")]
    pub login_path: String,
}

/// Polling loop configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PollerConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    #[serde(default = "default_collect_enabled")]
    pub collect_enabled: bool,

    #[serde(default = "default_collect_cooldown_ms")]
    pub collect_cooldown_ms: u64,

    #[serde(default = "default_recenter_after_ms")]
    pub recenter_after_ms: u64,

    #[serde(default = "default_recenter_zoom")]
    pub recenter_zoom: u8,
}

/// Session id sources
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SessionConfig {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub state_file: Option<String>,
}

/// Sample recording configuration
#[derive(Debug, Deserialize, Clone)]
pub struct RecorderConfig {
    #[serde(default = "default_recorder_enabled")]
    pub enabled: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_max_records_per_file")]
    pub max_records_per_file: usize,

    #[serde(default = "default_max_files_to_keep")]
    pub max_files_to_keep: usize,

    #[serde(default = "default_record_format")]
    pub format: String,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub file: Option<String>,
}

// Default value functions
fn default_base_url() -> String { "http://127.0.0.1:8000/api".to_string() }
fn default_request_timeout_ms() -> u64 { 5000 }
fn default_login_path() -> String { "/login".to_string() }

fn default_interval_ms() -> u64 { 1000 }
fn default_collect_enabled() -> bool { true }
fn default_collect_cooldown_ms() -> u64 { 2500 }
fn default_recenter_after_ms() -> u64 { 4000 }
fn default_recenter_zoom() -> u8 { 15 }

fn default_recorder_enabled() -> bool { false }
fn default_log_dir() -> String { "./telemetry".to_string() }
fn default_max_records_per_file() -> usize { 10000 }
fn default_max_files_to_keep() -> usize { 10 }
fn default_record_format() -> String { "jsonl".to_string() }

fn default_log_level() -> String { "info".to_string() }

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
            login_path: default_login_path(),
        }
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            collect_enabled: default_collect_enabled(),
            collect_cooldown_ms: default_collect_cooldown_ms(),
            recenter_after_ms: default_recenter_after_ms(),
            recenter_zoom: default_recenter_zoom(),
        }
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            enabled: default_recorder_enabled(),
            log_dir: default_log_dir(),
            max_records_per_file: default_max_records_per_file(),
            max_files_to_keep: default_max_files_to_keep(),
            format: default_record_format(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn invalid(message: impl Into<String>) -> PollerError {
    PollerError::Config(toml::de::Error::custom(message.into()))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use telemetry_poller::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        let base = self.backend.base_url.trim();
        if base.is_empty() {
            return Err(invalid("backend base_url cannot be empty"));
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(invalid("backend base_url must start with http:// or https://"));
        }

        if self.backend.request_timeout_ms == 0 || self.backend.request_timeout_ms > 60000 {
            return Err(invalid("request_timeout_ms must be between 1 and 60000"));
        }

        if !self.backend.login_path.starts_with('/') {
            return Err(invalid("login_path must start with '/'"));
        }

        if self.poller.interval_ms < 100 || self.poller.interval_ms > 60000 {
            return Err(invalid("interval_ms must be between 100 and 60000"));
        }

        if self.poller.collect_cooldown_ms > 60000 {
            return Err(invalid("collect_cooldown_ms must be at most 60000"));
        }

        if self.poller.recenter_after_ms > 600000 {
            return Err(invalid("recenter_after_ms must be at most 600000"));
        }

        if self.poller.recenter_zoom > 19 {
            return Err(invalid("recenter_zoom must be between 0 and 19"));
        }

        if self.recorder.enabled && self.recorder.log_dir.is_empty() {
            return Err(invalid("recorder log_dir cannot be empty when enabled"));
        }

        if self.recorder.max_records_per_file == 0 {
            return Err(invalid("max_records_per_file must be greater than 0"));
        }

        if self.recorder.max_files_to_keep == 0 {
            return Err(invalid("max_files_to_keep must be greater than 0"));
        }

        if self.recorder.format != "jsonl" {
            return Err(invalid("recorder format must be 'jsonl' (only supported format)"));
        }

        if !["trace", "debug", "info", "warn", "error"].contains(&self.logging.level.as_str()) {
            return Err(invalid(format!(
                "logging level '{}' must be one of: trace, debug, info, warn, error",
                self.logging.level
            )));
        }

        Ok(())
    }
}
