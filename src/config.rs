//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub watcher: WatcherConfig,

    #[serde(default)]
    pub share: ShareConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote GraphQL API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_base")]
    pub base_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_api_base() -> String {
    "http://localhost:4000".to_string()
}

fn default_request_timeout() -> u64 {
    10_000
}

fn default_max_retries() -> u32 {
    3
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base(),
            request_timeout_ms: default_request_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl ApiConfig {
    /// Create config pointing at the given API base
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// API base with trailing slashes removed
    pub fn normalized_base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Join the API base and a path
    pub fn api_url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.normalized_base(), path)
        } else {
            format!("{}/{}", self.normalized_base(), path)
        }
    }

    /// GraphQL endpoint; relative `/graphql` when no base is set
    pub fn graphql_url(&self) -> String {
        let base = self.normalized_base();
        if base.is_empty() {
            "/graphql".to_string()
        } else {
            format!("{}/graphql", base)
        }
    }
}

/// Garden job watcher configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WatcherConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_frame_interval")]
    pub frame_interval_ms: u64,

    /// 0 keeps polling through any number of failed queries
    #[serde(default = "default_max_consecutive_errors")]
    pub max_consecutive_errors: u32,
}

fn default_poll_interval() -> u64 {
    1500
}

fn default_frame_interval() -> u64 {
    16 // ~60 fps
}

fn default_max_consecutive_errors() -> u32 {
    20
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            frame_interval_ms: default_frame_interval(),
            max_consecutive_errors: default_max_consecutive_errors(),
        }
    }
}

/// Share page server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ShareConfig {
    #[serde(default = "default_share_host")]
    pub host: String,

    #[serde(default = "default_share_port")]
    pub port: u16,

    /// Cloudinary cloud hosting the garden images
    #[serde(default)]
    pub cloud_name: String,
}

fn default_share_host() -> String {
    "0.0.0.0".to_string()
}

fn default_share_port() -> u16 {
    8083
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            host: default_share_host(),
            port: default_share_port(),
            cloud_name: String::new(),
        }
    }
}

impl ShareConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,

    pub file: Option<String>,
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
            file: None,
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

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, String> {
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
            dirs::config_dir().map(|p| p.join("moodgarden").join("config.toml")),
            Some(PathBuf::from("/etc/moodgarden/config.toml")),
            Some(PathBuf::from("./config.toml")),
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
        if let Ok(base) = std::env::var("MOODGARDEN_API_BASE") {
            self.api.base_url = base;
        }

        if let Ok(interval) = std::env::var("MOODGARDEN_POLL_INTERVAL_MS") {
            if let Ok(ms) = interval.parse() {
                self.watcher.poll_interval_ms = ms;
            }
        }

        if let Ok(cloud) = std::env::var("MOODGARDEN_CLOUD_NAME") {
            self.share.cloud_name = cloud;
        }
        if let Ok(host) = std::env::var("MOODGARDEN_SHARE_HOST") {
            self.share.host = host;
        }
        if let Ok(port) = std::env::var("MOODGARDEN_SHARE_PORT") {
            if let Ok(p) = port.parse() {
                self.share.port = p;
            }
        }

        if let Ok(level) = std::env::var("MOODGARDEN_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("MOODGARDEN_LOG_FORMAT") {
            self.logging.format = format;
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
    r#"# Mood Gardens Configuration
#
# Environment variables override these settings:
# - MOODGARDEN_API_BASE
# - MOODGARDEN_POLL_INTERVAL_MS
# - MOODGARDEN_CLOUD_NAME
# - MOODGARDEN_SHARE_HOST
# - MOODGARDEN_SHARE_PORT
# - MOODGARDEN_LOG_LEVEL
# - MOODGARDEN_LOG_FORMAT

[api]
# Base URL of the Mood Gardens API (GraphQL is served at <base>/graphql)
base_url = "http://localhost:4000"

# Request timeout (ms)
request_timeout_ms = 10000

# Retry attempts for read-only queries
max_retries = 3

[watcher]
# How often to poll a pending garden job (ms)
poll_interval_ms = 1500

# Progress estimate refresh rate (ms)
frame_interval_ms = 16

# Stop watching after this many failed polls in a row (0 = never)
max_consecutive_errors = 20

[share]
# Share page server host
host = "0.0.0.0"

# Share page server port
port = 8083

# Cloudinary cloud name for garden image URLs
cloud_name = ""

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"

# Optional log file path
# file = "/var/log/moodgarden/moodgarden.log"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.watcher.poll_interval_ms, 1500);
        assert_eq!(config.share.port, 8083);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_generated_config_parses() {
        let config = Config::parse(&generate_default_config()).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:4000");
        assert_eq!(config.watcher.max_consecutive_errors, 20);
        assert_eq!(config.share.cloud_name, "");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = Config::parse("[watcher]\npoll_interval_ms = 3000\n").unwrap();
        assert_eq!(config.watcher.poll_interval_ms, 3000);
        assert_eq!(config.watcher.frame_interval_ms, 16);
        assert_eq!(config.api.max_retries, 3);
    }

    #[test]
    fn test_graphql_url() {
        assert_eq!(
            ApiConfig::new("https://api.example.com///").graphql_url(),
            "https://api.example.com/graphql"
        );
        assert_eq!(ApiConfig::new("").graphql_url(), "/graphql");
        assert_eq!(
            ApiConfig::new("https://api.example.com/").api_url("share-meta/abc"),
            "https://api.example.com/share-meta/abc"
        );
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Path::new("/nonexistent/moodgarden.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
