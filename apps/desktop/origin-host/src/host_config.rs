use common::ErrorLocation;

use origin_core::error::config::ConfigError;

use std::panic::Location;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "host.json";
const CONFIG_VERSION: u32 = 1;
const DEFAULT_SERVE_ROOT: &str = "./www";

/// Host-only settings, stored next to `origin.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HostConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Directory holding the packaged app; `./www` when unset.
    #[serde(default)]
    pub serve_root: Option<String>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            serve_root: None,
        }
    }
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

impl HostConfig {
    /// Load from {config_dir}/host.json, or defaults if the file is missing.
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            info!(
                "Host config not found at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents =
            std::fs::read_to_string(&config_path).map_err(|e| ConfigError::ReadError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                source: e,
            })?;

        let config: HostConfig =
            serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                reason: e.to_string(),
            })?;

        config.validate()?;
        info!("Host config loaded from {}", config_path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version == 0 || self.version > CONFIG_VERSION {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!(
                    "Invalid version: {} (expected 1-{})",
                    self.version, CONFIG_VERSION
                ),
            });
        }

        if self
            .serve_root
            .as_deref()
            .is_some_and(|root| root.trim().is_empty())
        {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: "serve_root cannot be empty".to_string(),
            });
        }

        Ok(())
    }

    pub fn serve_root(&self) -> PathBuf {
        PathBuf::from(self.serve_root.as_deref().unwrap_or(DEFAULT_SERVE_ROOT))
    }
}
