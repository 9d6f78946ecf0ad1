use crate::error::config::ConfigError;
use crate::{DEFAULT_APP_BASE, DEFAULT_DOCUMENT, DEFAULT_PASSTHROUGH_SCHEME, EARLY_QUEUE_CAPACITY};

use common::ErrorLocation;

use std::panic::Location;
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "origin.json";
const CONFIG_VERSION: u32 = 1;

// ============================================
// CONFIG STRUCTS
// ============================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    /// Loopback port to bind; 0 lets the OS pick an ephemeral one.
    #[serde(default)]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PathConfig {
    #[serde(default = "default_app_base")]
    pub app_base: String,
    #[serde(default = "default_document")]
    pub default_document: String,
    #[serde(default = "default_passthrough_scheme")]
    pub passthrough_scheme: String,
    /// Start page discovered by the host, absolute or relative to `app_base`.
    #[serde(default)]
    pub start_page: Option<String>,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            app_base: default_app_base(),
            default_document: default_document(),
            passthrough_scheme: default_passthrough_scheme(),
            start_page: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BridgeConfig {
    #[serde(default = "default_early_queue_capacity")]
    pub early_queue_capacity: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            early_queue_capacity: default_early_queue_capacity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CoreConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub paths: PathConfig,

    #[serde(default)]
    pub bridge: BridgeConfig,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            server: ServerConfig::default(),
            paths: PathConfig::default(),
            bridge: BridgeConfig::default(),
        }
    }
}

// ============================================
// DEFAULT FUNCTIONS
// ============================================

fn default_version() -> u32 {
    CONFIG_VERSION
}
fn default_app_base() -> String {
    DEFAULT_APP_BASE.to_string()
}
fn default_document() -> String {
    DEFAULT_DOCUMENT.to_string()
}
fn default_passthrough_scheme() -> String {
    DEFAULT_PASSTHROUGH_SCHEME.to_string()
}
fn default_early_queue_capacity() -> usize {
    EARLY_QUEUE_CAPACITY
}

// ============================================
// IMPLEMENTATION
// ============================================

impl CoreConfig {
    /// Load config from {config_dir}/origin.json.
    ///
    /// # Returns
    ///
    /// Returns defaults if the file is missing.
    /// Returns `Err(ConfigError)` if the file exists but is corrupted or invalid.
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            info!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path).map_err(|e| {
            warn!("Failed to read config file: {}", e);
            ConfigError::ReadError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                source: e,
            }
        })?;

        let mut config: CoreConfig = serde_json::from_str(&contents).map_err(|e| {
            warn!("Failed to parse config JSON: {}", e);
            ConfigError::ParseError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                reason: e.to_string(),
            }
        })?;

        config.validate()?;
        config.normalize();

        info!("Config loaded from {}", config_path.display());
        Ok(config)
    }

    /// Save config to {config_dir}/origin.json using temp file + rename.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if validation, directory creation, serialization,
    /// write or rename fails.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        std::fs::create_dir_all(config_dir).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: config_dir.to_path_buf(),
            source: e,
        })?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let temp_path = config_dir.join(format!("{}.tmp", CONFIG_FILE_NAME));

        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::SerializeError {
            location: ErrorLocation::from(Location::caller()),
            reason: e.to_string(),
        })?;

        std::fs::write(&temp_path, json).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: temp_path.clone(),
            source: e,
        })?;

        std::fs::rename(&temp_path, &config_path).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: config_path.clone(),
            source: e,
        })?;

        info!("Config saved to {}", config_path.display());
        Ok(())
    }

    /// Validate config values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if any value is invalid.
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

        if self.paths.app_base.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: "app_base cannot be empty".to_string(),
            });
        }

        if self.paths.app_base.split('/').any(|segment| segment == "..") {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!("app_base must not contain '..': {}", self.paths.app_base),
            });
        }

        if self.paths.passthrough_scheme.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: "passthrough_scheme cannot be empty".to_string(),
            });
        }

        if self.bridge.early_queue_capacity == 0 {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: "early_queue_capacity must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    /// Ensure `app_base` ends with `/` and the default document has no leading slash.
    pub fn normalize(&mut self) {
        if !self.paths.app_base.ends_with('/') {
            self.paths.app_base.push('/');
        }
        let trimmed = self.paths.default_document.trim_start_matches('/');
        self.paths.default_document = if trimmed.is_empty() {
            DEFAULT_DOCUMENT.to_string()
        } else {
            trimmed.to_string()
        };
    }
}
