//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use crate::fetch::FetchConfig;
use crate::sync::SyncConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fetch: FetchSettings,

    #[serde(default)]
    pub sync: SyncSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote archive settings
#[derive(Debug, Clone, Deserialize)]
pub struct FetchSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_max_concurrent_months")]
    pub max_concurrent_months: usize,
}

fn default_base_url() -> String {
    "https://api.chess.com".to_string()
}

fn default_user_agent() -> String {
    format!("chessmirror/{}", env!("CARGO_PKG_VERSION"))
}

fn default_request_timeout() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    3
}

fn default_max_concurrent_months() -> usize {
    1 // strictly sequential
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout(),
            max_retries: default_max_retries(),
            max_concurrent_months: default_max_concurrent_months(),
        }
    }
}

/// Sync behavior settings
#[derive(Debug, Clone, Deserialize)]
pub struct SyncSettings {
    #[serde(default)]
    pub include_unrated: bool,

    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    /// History window used when no start date is given
    #[serde(default = "default_history_months")]
    pub history_months: u32,
}

fn default_refresh_interval() -> u64 {
    60
}

fn default_history_months() -> u32 {
    3
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            include_unrated: false,
            refresh_interval_secs: default_refresh_interval(),
            history_months: default_history_months(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("chessmirror").join("config.toml")),
            Some(PathBuf::from("./chessmirror.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        // Fetch overrides
        if let Some(url) = var("CHESSMIRROR_BASE_URL") {
            self.fetch.base_url = url;
        }
        if let Some(secs) = var("CHESSMIRROR_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.fetch.request_timeout_secs = secs;
        }
        if let Some(retries) = var("CHESSMIRROR_MAX_RETRIES").and_then(|v| v.parse().ok()) {
            self.fetch.max_retries = retries;
        }
        if let Some(n) = var("CHESSMIRROR_CONCURRENCY").and_then(|v| v.parse().ok()) {
            self.fetch.max_concurrent_months = n;
        }

        // Logging overrides
        if let Some(level) = var("CHESSMIRROR_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("CHESSMIRROR_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Settings for the archive client
    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            base_url: self.fetch.base_url.clone(),
            user_agent: self.fetch.user_agent.clone(),
            request_timeout_ms: self.fetch.request_timeout_secs * 1000,
            max_retries: self.fetch.max_retries,
            ..Default::default()
        }
    }

    /// Settings for the sync engine
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            max_concurrent_months: self.fetch.max_concurrent_months,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# chessmirror Configuration
#
# Environment variables override these settings:
# - CHESSMIRROR_BASE_URL
# - CHESSMIRROR_TIMEOUT_SECS
# - CHESSMIRROR_MAX_RETRIES
# - CHESSMIRROR_CONCURRENCY
# - CHESSMIRROR_LOG_LEVEL
# - CHESSMIRROR_LOG_FORMAT

[fetch]
# Game archive API
base_url = "https://api.chess.com"

# Per-request timeout in seconds
request_timeout_secs = 10

# Attempts per month before giving up on it
max_retries = 3

# Month requests in flight during a full load (1 = one at a time)
max_concurrent_months = 1

[sync]
# Keep unrated games in the mirror
include_unrated = false

# How often `watch` refreshes the current month (seconds)
refresh_interval_secs = 60

# History window when no --since date is given (months)
history_months = 3

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
