//! Configuration schema (rowschema.toml)

use serde::{Deserialize, Serialize};

fn default_key_suffix() -> String {
    "_key".to_string()
}

fn default_max_nesting_depth() -> usize {
    64
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Appended to the value schema name to name the derived key schema
    #[serde(default = "default_key_suffix")]
    pub key_suffix: String,

    /// Recursion limit when reconstructing wire schemas
    #[serde(default = "default_max_nesting_depth")]
    pub max_nesting_depth: usize,

    /// Namespace for new schemas when the caller does not pass one
    #[serde(default)]
    pub default_namespace: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            key_suffix: default_key_suffix(),
            max_nesting_depth: default_max_nesting_depth(),
            default_namespace: None,
        }
    }
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::from_toml(&contents)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}
