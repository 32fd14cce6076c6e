//! Configuration schema (sourcegen.toml)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Quoting applied to string scalars when writing source YAML
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStyle {
    /// Quote only where YAML requires it
    Minimal,

    /// Always write strings double-quoted
    Double,
}

impl Default for QuoteStyle {
    fn default() -> Self {
        Self::Minimal
    }
}

/// Layout of written source YAML
///
/// The defaults reproduce the layout dbt projects conventionally use:
///
/// ```yaml
/// sources:
///   - name: raw
///     tables:
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatConfig {
    /// Spaces per nested mapping level
    #[serde(default = "default_indent")]
    pub indent: usize,

    /// Spaces between a key and the `-` of its sequence items
    #[serde(default = "default_sequence_offset")]
    pub sequence_offset: usize,

    /// String quoting style
    #[serde(default)]
    pub quote_style: QuoteStyle,
}

fn default_indent() -> usize {
    2
}

fn default_sequence_offset() -> usize {
    2
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            indent: default_indent(),
            sequence_offset: default_sequence_offset(),
            quote_style: QuoteStyle::default(),
        }
    }
}

/// Warehouse connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WarehouseConfig {
    /// GCP project queried for the dataset
    #[serde(default)]
    pub project_id: Option<String>,

    /// Service account key file; Application Default Credentials when unset
    #[serde(default)]
    pub credentials: Option<PathBuf>,
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Warehouse connection configuration
    #[serde(default)]
    pub warehouse: Option<WarehouseConfig>,

    /// Output formatting
    #[serde(default)]
    pub format: FormatConfig,

    /// Project root path (for resolving relative paths)
    #[serde(skip)]
    pub project_root: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            warehouse: None,
            format: FormatConfig::default(),
            project_root: std::env::current_dir().unwrap_or_default(),
        }
    }
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        let mut config = Self::from_toml(&contents)?;

        // Set project root to parent of config file
        if let Some(parent) = path.parent() {
            config.project_root = parent.to_path_buf();
        }

        Ok(config)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Project id from the warehouse section, if configured
    pub fn project_id(&self) -> Option<&str> {
        self.warehouse.as_ref()?.project_id.as_deref()
    }

    /// Credentials path, resolved against the project root when relative
    pub fn credentials(&self) -> Option<PathBuf> {
        let path = self.warehouse.as_ref()?.credentials.as_ref()?;
        if path.is_relative() {
            Some(self.project_root.join(path))
        } else {
            Some(path.clone())
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.format.indent == 0 {
            return Err(ConfigError::InvalidValue(
                "format.indent must be at least 1".to_string(),
            ));
        }
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

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}
