use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::errors::CounterError;

/// Counter persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterConfig {
    /// Directory holding the backing file
    #[serde(default = "CounterConfig::default_data_dir")]
    pub data_dir: String,

    /// Backing file name inside the data directory
    #[serde(default = "CounterConfig::default_file_name")]
    pub file_name: String,

    /// Minimum interval between physical writes (seconds)
    #[serde(default = "CounterConfig::default_debounce_interval_secs")]
    pub debounce_interval_secs: u64,

    /// Bounded wait for forced flushes and writer teardown (milliseconds)
    #[serde(default = "CounterConfig::default_shutdown_timeout_millis")]
    pub shutdown_timeout_millis: u64,
}

impl CounterConfig {
    fn default_data_dir() -> String {
        "data".to_string()
    }
    fn default_file_name() -> String {
        "visit_count.json".to_string()
    }
    fn default_debounce_interval_secs() -> u64 {
        1
    }
    fn default_shutdown_timeout_millis() -> u64 {
        1_000
    }

    /// Full path of the backing file.
    pub fn backing_file(&self) -> PathBuf {
        Path::new(&self.data_dir).join(&self.file_name)
    }

    pub fn debounce_interval(&self) -> Duration {
        Duration::from_secs(self.debounce_interval_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_millis)
    }
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            data_dir: Self::default_data_dir(),
            file_name: Self::default_file_name(),
            debounce_interval_secs: Self::default_debounce_interval_secs(),
            shutdown_timeout_millis: Self::default_shutdown_timeout_millis(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "ServerConfig::default_host")]
    pub host: String,

    #[serde(default = "ServerConfig::default_port")]
    pub port: u16,

    /// Request path prefixes that never bump the visit count
    #[serde(default = "ServerConfig::default_excluded_paths")]
    pub excluded_paths: Vec<String>,

    /// Static-asset extensions that never bump the visit count
    #[serde(default = "ServerConfig::default_excluded_extensions")]
    pub excluded_extensions: Vec<String>,
}

impl ServerConfig {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }
    fn default_port() -> u16 {
        8000
    }
    fn default_excluded_paths() -> Vec<String> {
        vec!["/visit-count".to_string(), "/health".to_string(), "/admin".to_string()]
    }
    fn default_excluded_extensions() -> Vec<String> {
        [".jpg", ".jpeg", ".png", ".gif", ".webp", ".css", ".js", ".ico", ".svg"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// The delegated exclusion policy: decides whether a request path
    /// qualifies for counting. Extension matching is case-insensitive.
    pub fn is_counted(&self, path: &str) -> bool {
        if self.excluded_paths.iter().any(|p| path.starts_with(p.as_str())) {
            return false;
        }
        let lower = path.to_ascii_lowercase();
        !self.excluded_extensions.iter().any(|ext| lower.ends_with(ext.as_str()))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            excluded_paths: Self::default_excluded_paths(),
            excluded_extensions: Self::default_excluded_extensions(),
        }
    }
}

/// Top-level application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub counter: CounterConfig,
}

impl AppConfig {
    /// Loads configuration from a TOML file. Missing sections and fields
    /// fall back to their defaults.
    pub fn load(path: &Path) -> Result<Self, CounterError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }
}
