//! Server configuration module
//!
//! Handles loading and parsing of server configuration from files and environment variables.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Path to the configuration file
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Server name displayed to players
    #[serde(default = "default_server_name")]
    pub server_name: String,

    /// Path to data files; player records live in `player_data` below it
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,

    /// Room every character is placed in on login
    #[serde(default = "default_starting_room")]
    pub starting_room: String,

    /// Log this crate at debug level when `RUST_LOG` is not set
    #[serde(default)]
    pub debug: bool,
}

// Default value functions
fn default_server_name() -> String {
    "Lurk".to_string()
}

fn default_data_path() -> PathBuf {
    PathBuf::from("./data")
}

fn default_starting_room() -> String {
    "Broom Closet".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from("config/server.toml"),
            server_name: default_server_name(),
            data_path: default_data_path(),
            starting_room: default_starting_room(),
            debug: false,
        }
    }
}

impl ServerConfig {
    /// Load configuration from file and environment variables
    pub async fn load() -> Result<Self> {
        let config_path = env::var("LURK_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/server.toml"));

        let mut config = if config_path.exists() {
            let content = tokio::fs::read_to_string(&config_path)
                .await
                .with_context(|| {
                    format!("Failed to read config file: {}", config_path.display())
                })?;

            Self::from_toml(&content).with_context(|| {
                format!("Failed to parse config file: {}", config_path.display())
            })?
        } else {
            Self::default()
        };

        config.config_path = config_path;

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Parse configuration from a TOML document
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("LURK_SERVER_NAME") {
            self.server_name = val;
        }
        if let Ok(val) = env::var("LURK_DATA_PATH") {
            self.data_path = PathBuf::from(val);
        }
        if let Ok(val) = env::var("LURK_STARTING_ROOM") {
            self.starting_room = val;
        }
        if let Ok(val) = env::var("LURK_DEBUG") {
            self.debug = val.to_lowercase() == "true" || val == "1";
        }
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.starting_room.trim().is_empty() {
            anyhow::bail!("Starting room must not be empty");
        }

        if self.data_path.as_os_str().is_empty() {
            anyhow::bail!("Data path must not be empty");
        }

        Ok(())
    }

    /// Directory holding one record file per character
    pub fn player_data_dir(&self) -> PathBuf {
        self.data_path.join("player_data")
    }

    /// Default log filter directive, used when `RUST_LOG` is not set
    pub fn log_directive(&self) -> &'static str {
        if self.debug {
            "info,lurk_server=debug"
        } else {
            "info"
        }
    }
}
