//! Loading and writing source YAML files

use crate::document::SourceDocument;
use crate::emit::Emitter;
use sourcegen_core::FormatConfig;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Reads and writes `SourceDocument`s as YAML
///
/// Formatting is fixed at construction; the store holds no other state.
#[derive(Debug, Clone, Default)]
pub struct YamlStore {
    format: FormatConfig,
}

impl YamlStore {
    pub fn new(format: FormatConfig) -> Self {
        Self { format }
    }

    pub fn format(&self) -> &FormatConfig {
        &self.format
    }

    /// Load a source file
    ///
    /// Returns `Ok(None)` when the file does not exist. A file holding only
    /// whitespace or comments loads as an empty document.
    pub fn load(&self, path: &Path) -> Result<Option<SourceDocument>, DocumentError> {
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| DocumentError::ReadError(path.display().to_string(), e.to_string()))?;

        self.parse(&contents)
            .map(Some)
            .map_err(|e| DocumentError::ParseError(path.display().to_string(), e))
    }

    /// Parse source YAML text
    pub fn parse(&self, yaml: &str) -> Result<SourceDocument, String> {
        let blank = yaml.lines().all(|line| {
            let line = line.trim();
            line.is_empty() || line.starts_with('#')
        });
        if blank {
            return Ok(SourceDocument::new());
        }

        let value: serde_yaml::Value = serde_yaml::from_str(yaml).map_err(|e| e.to_string())?;
        if value.is_null() {
            return Ok(SourceDocument::new());
        }
        if !value.is_mapping() {
            return Err(
                "expected a mapping with `version` and `sources` at the top level".to_string(),
            );
        }
        serde_yaml::from_value(value).map_err(|e| e.to_string())
    }

    /// Render a document to YAML text
    pub fn render(&self, document: &SourceDocument) -> Result<String, DocumentError> {
        let value = serde_yaml::to_value(document)
            .map_err(|e| DocumentError::SerializeError(e.to_string()))?;

        Emitter::new(&self.format)
            .emit(&value)
            .map_err(|e| DocumentError::SerializeError(e.to_string()))
    }

    /// Write a document, creating parent directories as needed
    ///
    /// The YAML goes to a temporary file next to `path` that is then renamed
    /// over it, so a failed write leaves the previous file intact.
    pub fn store(&self, path: &Path, document: &SourceDocument) -> Result<(), DocumentError> {
        let yaml = self.render(document)?;
        let target = path.display().to_string();
        let write_error = |e: io::Error| DocumentError::WriteError(target.clone(), e.to_string());

        let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                std::fs::create_dir_all(parent).map_err(write_error)?;
                parent
            }
            None => Path::new("."),
        };

        let mut temp = NamedTempFile::new_in(dir).map_err(write_error)?;
        temp.write_all(yaml.as_bytes()).map_err(write_error)?;
        temp.as_file().sync_all().map_err(write_error)?;
        temp.persist(path).map_err(|e| write_error(e.error))?;

        Ok(())
    }
}

/// Errors raised while loading or storing source files
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("Failed to read source file {0}: {1}")]
    ReadError(String, String),

    #[error("Failed to parse source file {0}: {1}")]
    ParseError(String, String),

    #[error("Failed to serialize source document: {0}")]
    SerializeError(String),

    #[error("Failed to write source file {0}: {1}")]
    WriteError(String, String),
}

impl DocumentError {
    /// Whether the error happened while reading an existing document
    pub fn is_load_error(&self) -> bool {
        matches!(self, Self::ReadError(..) | Self::ParseError(..))
    }
}
