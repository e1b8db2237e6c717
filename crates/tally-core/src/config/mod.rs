pub mod fill_config;
pub mod logging_config;
pub mod storage_config;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{ConfigError, FillError};

pub use fill_config::FillConfig;
pub use logging_config::LoggingConfig;
pub use storage_config::StorageConfig;

/// Top-level configuration aggregating all subsystem configs.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TallyConfig {
    pub storage: StorageConfig,
    pub fill: FillConfig,
    pub logging: LoggingConfig,
}

impl TallyConfig {
    /// Load config from a TOML string, falling back to defaults for missing fields.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Load config from a TOML file on disk.
    pub fn from_file(path: &Path) -> Result<Self, FillError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(Self::from_toml(&raw)?)
    }
}
