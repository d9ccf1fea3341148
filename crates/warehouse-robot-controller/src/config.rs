/*
[INPUT]:  YAML configuration file (optional)
[OUTPUT]: Validated controller configuration
[POS]:    Configuration layer - engine endpoint, robot, polling, buffer
[UPDATE]: When adding new configuration options
*/

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use warehouse_robot_adapter::{ClientConfig, DEFAULT_BASE_URL, WarehouseClient};

use crate::command::CommandBuffer;
use crate::controller::PollPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration for the controller
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ControllerConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    /// Robot the command batches are sent to
    #[serde(default = "default_robot_id")]
    pub robot_id: String,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub commands: CommandsConfig,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            robot_id: default_robot_id(),
            polling: PollingConfig::default(),
            commands: CommandsConfig::default(),
        }
    }
}

/// Where the warehouse engine lives
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PollingConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,
    /// How long CANCELLED is shown before returning to IDLE
    #[serde(default = "default_cancel_hold_ms")]
    pub cancel_hold_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            max_consecutive_failures: default_max_consecutive_failures(),
            cancel_hold_ms: default_cancel_hold_ms(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CommandsConfig {
    /// Inserted between appended directions; none by default
    #[serde(default)]
    pub separator: Option<char>,
}

fn default_robot_id() -> String {
    "0".to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_max_consecutive_failures() -> u32 {
    5
}

fn default_cancel_hold_ms() -> u64 {
    3000
}

impl ControllerConfig {
    /// Load configuration from YAML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        // An empty document means "all defaults".
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// `<config_dir>/warehouse-robot/config.yaml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("warehouse-robot").join("config.yaml"))
    }

    /// Explicit path must exist; the default path is used only if present.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => {
                tracing::debug!(path = %path.display(), "using default config file");
                Self::from_file(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.robot_id.trim().is_empty() {
            return Err(ConfigError::Invalid("robot_id must not be empty".to_string()));
        }
        if self.polling.interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "polling.interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.polling.max_consecutive_failures == 0 {
            return Err(ConfigError::Invalid(
                "polling.max_consecutive_failures must be greater than zero".to_string(),
            ));
        }
        if self.engine.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "engine.timeout_secs must be greater than zero".to_string(),
            ));
        }
        self.build_client()
            .map(|_| ())
            .map_err(|err| ConfigError::Invalid(format!("engine.base_url: {err}")))
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            timeout: Duration::from_secs(self.engine.timeout_secs),
            connect_timeout: Duration::from_secs(self.engine.connect_timeout_secs),
        }
    }

    pub fn build_client(&self) -> warehouse_robot_adapter::Result<WarehouseClient> {
        WarehouseClient::with_config_and_base_url(self.client_config(), &self.engine.base_url)
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.polling.interval_ms),
            max_consecutive_failures: self.polling.max_consecutive_failures,
            cancel_hold: Duration::from_millis(self.polling.cancel_hold_ms),
        }
    }

    pub fn command_buffer(&self) -> CommandBuffer {
        CommandBuffer::with_separator(self.commands.separator)
    }
}
