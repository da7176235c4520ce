//! Configuration management for scan defaults.
//!
//! Stores configuration in JSON format at `~/.ospd-keyscan/config.json`.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::domain::params::{invalid, parse_bool};
use crate::domain::{ScanOptions, DEFAULT_SCAN_TIMEOUT, DEFAULT_SSH_PORT};
use crate::engine::DEFAULT_MAX_CONCURRENCY;
use crate::error::{Error, Result};

/// Configuration data stored in JSON format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Explicit ssh-keyscan path. Searched for when unset.
    #[serde(default, rename = "toolPath", skip_serializing_if = "Option::is_none")]
    pub tool_path: Option<PathBuf>,

    /// Port used when a scan does not name one.
    #[serde(default = "default_port", rename = "defaultPort")]
    pub default_port: u16,

    /// Subprocess timeout in seconds.
    #[serde(default = "default_timeout_secs", rename = "timeoutSecs")]
    pub timeout_secs: u64,

    /// ssh-keyscan's own connect timeout (`-T`) in seconds.
    #[serde(
        default,
        rename = "connectTimeoutSecs",
        skip_serializing_if = "Option::is_none"
    )]
    pub connect_timeout_secs: Option<u32>,

    /// Number of targets scanned at once.
    #[serde(default = "default_max_concurrency", rename = "maxConcurrency")]
    pub max_concurrency: usize,

    /// Dump keys as log results by default.
    #[serde(default, rename = "keysAsLog")]
    pub keys_as_log: bool,

    /// Flags passed to ssh-keyscan on every run.
    #[serde(default, rename = "extraFlags")]
    pub extra_flags: Vec<String>,
}

fn default_port() -> u16 {
    DEFAULT_SSH_PORT
}

fn default_timeout_secs() -> u64 {
    DEFAULT_SCAN_TIMEOUT.as_secs()
}

fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tool_path: None,
            default_port: default_port(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: None,
            max_concurrency: default_max_concurrency(),
            keys_as_log: false,
            extra_flags: Vec::new(),
        }
    }
}

impl Config {
    /// Check values that serde cannot.
    pub fn validate(&self) -> Result<()> {
        if self.default_port == 0 {
            return Err(Error::Config("defaultPort must be in 1..=65535".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config("timeoutSecs must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Change one setting by its JSON name.
    ///
    /// An empty value clears optional settings. `extraFlags` takes a
    /// space separated list.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "toolPath" => {
                self.tool_path = (!value.is_empty()).then(|| PathBuf::from(value));
            }
            "defaultPort" => self.default_port = parse_value(key, value)?,
            "timeoutSecs" => self.timeout_secs = parse_value(key, value)?,
            "connectTimeoutSecs" => {
                self.connect_timeout_secs = if value.is_empty() {
                    None
                } else {
                    Some(parse_value(key, value)?)
                };
            }
            "maxConcurrency" => self.max_concurrency = parse_value(key, value)?,
            "keysAsLog" => {
                self.keys_as_log = parse_bool(value).ok_or_else(|| invalid(key, value))?;
            }
            "extraFlags" => {
                self.extra_flags = value.split_whitespace().map(str::to_string).collect();
            }
            _ => return Err(Error::Config(format!("Unknown setting: {}", key))),
        }
        self.validate()
    }

    /// Scan options derived from this configuration.
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions::default()
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_connect_timeout(self.connect_timeout_secs)
            .with_extra_flags(self.extra_flags.iter().cloned())
            .with_keys_as_log(self.keys_as_log)
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| invalid(key, value))
}

/// Configuration store for managing scanner settings.
///
/// Handles reading and writing configuration to `~/.ospd-keyscan/config.json`.
pub struct ConfigStore {
    /// Path to the configuration file.
    config_path: PathBuf,
}

impl ConfigStore {
    /// Create a new config store with the default path.
    ///
    /// Default path: `~/.ospd-keyscan/config.json`
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

        let config_dir = home.join(".ospd-keyscan");
        let config_path = config_dir.join("config.json");

        Ok(Self { config_path })
    }

    /// Create a config store with a custom path.
    pub fn with_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load configuration from disk.
    ///
    /// Returns default config if the file doesn't exist.
    pub async fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub async fn save(&self, config: &Config) -> Result<()> {
        config.validate()?;

        if let Some(config_dir) = self.config_path.parent() {
            if !config_dir.exists() {
                fs::create_dir_all(config_dir).await.map_err(|e| {
                    Error::Config(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let content = serde_json::to_string_pretty(config)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        // Write atomically by writing to temp file then renaming
        let temp_path = self.config_path.with_extension("json.tmp");

        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to create temp config file: {}", e)))?;

        file.write_all(content.as_bytes())
            .await
            .map_err(|e| Error::Config(format!("Failed to write config: {}", e)))?;

        file.sync_all()
            .await
            .map_err(|e| Error::Config(format!("Failed to sync config: {}", e)))?;

        fs::rename(&temp_path, &self.config_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to rename config file: {}", e)))?;

        Ok(())
    }

    /// Load, modify and save in one step.
    pub async fn update<F>(&self, change: F) -> Result<Config>
    where
        F: FnOnce(&mut Config),
    {
        let mut config = self.load().await?;
        change(&mut config);
        self.save(&config).await?;
        Ok(config)
    }

    /// Restore the defaults.
    pub async fn reset(&self) -> Result<()> {
        self.save(&Config::default()).await
    }
}
