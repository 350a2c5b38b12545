// Replay Configuration Module
// Handles configuration from files and environment variables.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Replay configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub target: TargetConfig,
    #[serde(default)]
    pub replay: ReplayConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base_url = self.target.base_url.trim();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::Validation(format!(
                "target.base_url must be an http(s) URL, got '{}'",
                self.target.base_url
            )));
        }
        if !self.replay.speed.is_finite() || self.replay.speed <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "replay.speed must be a positive number, got {}",
                self.replay.speed
            )));
        }
        Ok(())
    }
}

/// Downstream IoT gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Gateway base URL, without a trailing path
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Path prefix for `data` events
    #[serde(default = "default_data_path")]
    pub data_path: String,
    /// Path prefix for every other event type
    #[serde(default = "default_alert_path")]
    pub alert_path: String,
    #[serde(default = "default_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_base_url() -> String {
    "http://localhost:8888".to_string()
}

fn default_data_path() -> String {
    "/iot/send/data".to_string()
}

fn default_alert_path() -> String {
    "/iot/send/alert".to_string()
}

fn default_timeout_ms() -> u64 {
    1000
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            data_path: default_data_path(),
            alert_path: default_alert_path(),
            connect_timeout_ms: default_timeout_ms(),
            request_timeout_ms: default_timeout_ms(),
        }
    }
}

impl TargetConfig {
    /// Endpoint for a target's `data` events
    pub fn data_url(&self, target_id: &str) -> String {
        self.url(&self.data_path, target_id)
    }

    /// Endpoint for a target's alert (and unrecognized) events
    pub fn alert_url(&self, target_id: &str) -> String {
        self.url(&self.alert_path, target_id)
    }

    fn url(&self, path: &str, target_id: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim().trim_end_matches('/'),
            path.trim_matches('/'),
            target_id
        )
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Replay pacing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// Playback speed multiplier (1.0 = recorded timing)
    #[serde(default = "default_speed")]
    pub speed: f64,
}

fn default_speed() -> f64 {
    1.0
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            speed: default_speed(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    Io(String),
    #[error("Failed to parse configuration: {0}")]
    Parse(String),
    #[error("Invalid configuration: {0}")]
    Validation(String),
}
