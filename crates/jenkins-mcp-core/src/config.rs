//! Configuration management for jenkins-mcp.
//!
//! Handles loading and saving configuration from TOML files.
//! Config files are stored in platform-specific locations:
//!
//! - **macOS/Linux**: `~/.config/jenkins-mcp/config.toml`
//! - **Windows**: `%APPDATA%\jenkins-mcp\config.toml`
//!
//! API tokens are never written here; they come from the environment
//! (see [`crate::credentials`]).
//!
//! # Example
//!
//! ```ignore
//! use jenkins_mcp_core::config::Config;
//!
//! let mut config = Config::load()?;
//! config.set("jenkins.url", "http://localhost:8081")?;
//! config.set("polling.queue_max_attempts", "20")?;
//! config.save()?;
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

/// Config file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Config directory name.
const CONFIG_DIR_NAME: &str = "jenkins-mcp";

// =============================================================================
// Configuration structures
// =============================================================================

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Default Jenkins server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jenkins: Option<JenkinsConfig>,

    /// Bounds for the trigger-and-track polling loops
    #[serde(default)]
    pub polling: PollingConfig,
}

/// Default Jenkins server settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JenkinsConfig {
    /// Base URL used when a caller does not pass `jenkins_url`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Username paired with the API token from the environment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Polling bounds and HTTP timeouts.
///
/// Each loop stops at whichever comes first: the attempt count or the
/// wall-clock ceiling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub queue_poll_interval_ms: u64,
    pub queue_max_attempts: u32,
    pub queue_max_wait_secs: u64,
    pub build_poll_interval_ms: u64,
    pub build_max_attempts: u32,
    pub build_max_wait_secs: u64,
    /// Timeout of every single HTTP request
    pub request_timeout_secs: u64,
    /// Keep only the tail of the console log; 0 keeps everything
    pub max_console_chars: usize,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            queue_poll_interval_ms: 1_000,
            queue_max_attempts: 10,
            queue_max_wait_secs: 15,
            build_poll_interval_ms: 2_000,
            build_max_attempts: 30,
            build_max_wait_secs: 90,
            request_timeout_secs: 10,
            max_console_chars: 100_000,
        }
    }
}

impl PollingConfig {
    pub fn queue_poll_interval(&self) -> Duration {
        Duration::from_millis(self.queue_poll_interval_ms)
    }

    pub fn queue_max_wait(&self) -> Duration {
        Duration::from_secs(self.queue_max_wait_secs)
    }

    pub fn build_poll_interval(&self) -> Duration {
        Duration::from_millis(self.build_poll_interval_ms)
    }

    pub fn build_max_wait(&self) -> Duration {
        Duration::from_secs(self.build_max_wait_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Reject bounds that make every request fail.
    pub fn validate(&self) -> Result<()> {
        if self.request_timeout_secs == 0 {
            return Err(Error::Config(
                "polling.request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Config implementation
// =============================================================================

impl Config {
    /// Get the configuration directory path.
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join(CONFIG_DIR_NAME))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
    }

    /// Get the configuration file path.
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from the default location.
    ///
    /// Returns a default config if the file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    ///
    /// Returns a default config if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = ?path, "Config file does not exist, using defaults");
            return Ok(Self::default());
        }

        debug!(path = ?path, "Loading config");

        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))?;
        config.polling.validate()?;

        info!(path = ?path, "Config loaded successfully");
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
        }

        debug!(path = ?path, "Saving config");

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, contents)
            .map_err(|e| Error::Config(format!("Failed to write config file: {}", e)))?;

        info!(path = ?path, "Config saved successfully");
        Ok(())
    }

    /// Default server URL, if configured.
    pub fn default_url(&self) -> Option<&str> {
        self.jenkins.as_ref().and_then(|j| j.url.as_deref())
    }

    /// Default username, if configured.
    pub fn default_username(&self) -> Option<&str> {
        self.jenkins.as_ref().and_then(|j| j.username.as_deref())
    }

    /// Set a configuration value by key path.
    ///
    /// Key format: `section.field` (e.g., `jenkins.url`, `polling.build_max_attempts`)
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let (section, field) = split_key(key)?;

        match section {
            "jenkins" => {
                let config = self.jenkins.get_or_insert_with(JenkinsConfig::default);
                match field {
                    "url" => config.url = Some(value.trim_end_matches('/').to_string()),
                    "username" | "user" => config.username = Some(value.to_string()),
                    _ => {
                        return Err(Error::Config(format!(
                            "Unknown Jenkins config field: {}",
                            field
                        )))
                    }
                }
            }
            "polling" => {
                let mut polling = self.polling.clone();
                match field {
                    "queue_poll_interval_ms" => {
                        polling.queue_poll_interval_ms = parse_value(key, value)?
                    }
                    "queue_max_attempts" => polling.queue_max_attempts = parse_value(key, value)?,
                    "queue_max_wait_secs" => polling.queue_max_wait_secs = parse_value(key, value)?,
                    "build_poll_interval_ms" => {
                        polling.build_poll_interval_ms = parse_value(key, value)?
                    }
                    "build_max_attempts" => polling.build_max_attempts = parse_value(key, value)?,
                    "build_max_wait_secs" => polling.build_max_wait_secs = parse_value(key, value)?,
                    "request_timeout_secs" => {
                        polling.request_timeout_secs = parse_value(key, value)?
                    }
                    "max_console_chars" => polling.max_console_chars = parse_value(key, value)?,
                    _ => {
                        return Err(Error::Config(format!(
                            "Unknown polling config field: {}",
                            field
                        )))
                    }
                }
                polling.validate()?;
                self.polling = polling;
            }
            _ => {
                return Err(Error::Config(format!("Unknown config section: {}", section)));
            }
        }

        Ok(())
    }

    /// Get a configuration value by key path.
    ///
    /// Key format: `section.field` (e.g., `jenkins.url`, `polling.build_max_attempts`)
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let (section, field) = split_key(key)?;

        match section {
            "jenkins" => {
                let Some(config) = &self.jenkins else {
                    return Ok(None);
                };
                match field {
                    "url" => Ok(config.url.clone()),
                    "username" | "user" => Ok(config.username.clone()),
                    _ => Err(Error::Config(format!(
                        "Unknown Jenkins config field: {}",
                        field
                    ))),
                }
            }
            "polling" => {
                let polling = &self.polling;
                let value = match field {
                    "queue_poll_interval_ms" => polling.queue_poll_interval_ms.to_string(),
                    "queue_max_attempts" => polling.queue_max_attempts.to_string(),
                    "queue_max_wait_secs" => polling.queue_max_wait_secs.to_string(),
                    "build_poll_interval_ms" => polling.build_poll_interval_ms.to_string(),
                    "build_max_attempts" => polling.build_max_attempts.to_string(),
                    "build_max_wait_secs" => polling.build_max_wait_secs.to_string(),
                    "request_timeout_secs" => polling.request_timeout_secs.to_string(),
                    "max_console_chars" => polling.max_console_chars.to_string(),
                    _ => {
                        return Err(Error::Config(format!(
                            "Unknown polling config field: {}",
                            field
                        )))
                    }
                };
                Ok(Some(value))
            }
            _ => Err(Error::Config(format!("Unknown config section: {}", section))),
        }
    }
}

fn split_key(key: &str) -> Result<(&str, &str)> {
    let parts: Vec<&str> = key.split('.').collect();
    if parts.len() != 2 {
        return Err(Error::Config(format!(
            "Invalid config key '{}'. Expected format: section.field",
            key
        )));
    }
    Ok((parts[0], parts[1]))
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("Invalid value '{}' for {}", value, key)))
}

// =============================================================================
// Tests
// =============================================================================
