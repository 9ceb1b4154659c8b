use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;
use log::warn;

/// Application configuration module
/// This module handles loading, validating and saving the settings that
/// drive subtitle resolution.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Network and pipeline settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Network settings shared by every fetch of a resolution
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FetchConfig {
    /// Timeout of a single HTTP request in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Deadline for a whole resolution in seconds (0 disables it)
    #[serde(default = "default_pipeline_timeout_secs")]
    pub pipeline_timeout_secs: u64,

    /// Number of subtitle segments fetched at the same time.
    /// Output order never depends on this value.
    #[serde(default = "default_max_parallel_segments")]
    pub max_parallel_segments: usize,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Extra request headers (e.g. Referer or Origin required by some CDNs)
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            pipeline_timeout_secs: default_pipeline_timeout_secs(),
            max_parallel_segments: default_max_parallel_segments(),
            user_agent: default_user_agent(),
            headers: BTreeMap::new(),
        }
    }
}

impl FetchConfig {
    /// Per-request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Whole-pipeline deadline, `None` when disabled
    pub fn pipeline_timeout(&self) -> Option<Duration> {
        if self.pipeline_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.pipeline_timeout_secs))
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<&LogLevel> for log::LevelFilter {
    fn from(level: &LogLevel) -> Self {
        match level {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_pipeline_timeout_secs() -> u64 {
    120
}

fn default_max_parallel_segments() -> usize {
    1 // sequential, playlist order
}

fn default_user_agent() -> String {
    format!("subweave/{}", env!("CARGO_PKG_VERSION"))
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.fetch.request_timeout_secs == 0 {
            return Err(anyhow!("fetch.request_timeout_secs must be greater than zero"));
        }

        if self.fetch.max_parallel_segments == 0 {
            return Err(anyhow!("fetch.max_parallel_segments must be at least 1"));
        }

        if self.fetch.user_agent.trim().is_empty() {
            return Err(anyhow!("fetch.user_agent must not be empty"));
        }

        for (name, value) in &self.fetch.headers {
            reqwest::header::HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| anyhow!("Invalid header name '{}': {}", name, e))?;
            reqwest::header::HeaderValue::from_str(value)
                .map_err(|e| anyhow!("Invalid value for header '{}': {}", name, e))?;
        }

        Ok(())
    }

    /// Load a configuration file, writing the defaults first if it does not exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let file = File::open(path)
                .context(format!("Failed to open config file: {}", path.display()))?;
            let reader = BufReader::new(file);
            let config: Config = serde_json::from_reader(reader)
                .context(format!("Failed to parse config file: {}", path.display()))?;
            Ok(config)
        } else {
            warn!("Config file not found at '{}', creating default config.", path.display());
            let config = Config::default();
            config.save(path)?;
            Ok(config)
        }
    }

    /// Write the configuration as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let config_json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path, config_json)
            .context(format!("Failed to write config to file: {}", path.display()))?;
        Ok(())
    }
}
