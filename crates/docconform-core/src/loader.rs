//! Document loading.
//!
//! Checkers consume an already-parsed [`Document`]. Loaders turn a path into
//! one; [`SerializedDocumentLoader`] reads the tree from JSON or YAML.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::config::is_yaml_path;
use crate::document::Document;

/// Errors that can occur when loading a document.
#[derive(Error, Debug)]
pub enum DocumentLoadError {
    #[error("Document not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read document {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse document {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Unsupported document format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
}

/// Produces parsed documents from paths.
pub trait DocumentLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<Document, DocumentLoadError>;
}

/// Loads a serialized document tree (`.json`, `.yaml`, `.yml`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SerializedDocumentLoader;

impl SerializedDocumentLoader {
    pub fn new() -> Self {
        Self
    }

    /// Whether this loader understands the file extension.
    pub fn supports(path: &Path) -> bool {
        is_yaml_path(path)
            || path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("json"))
    }
}

impl DocumentLoader for SerializedDocumentLoader {
    fn load(&self, path: &Path) -> Result<Document, DocumentLoadError> {
        if !path.exists() {
            return Err(DocumentLoadError::NotFound(path.to_path_buf()));
        }
        if !Self::supports(path) {
            return Err(DocumentLoadError::UnsupportedFormat(path.to_path_buf()));
        }

        let contents = fs::read_to_string(path).map_err(|source| DocumentLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let parse_error = |message: String| DocumentLoadError::Parse {
            path: path.to_path_buf(),
            message,
        };
        let document: Document = if is_yaml_path(path) {
            serde_yaml::from_str(&contents).map_err(|e| parse_error(e.to_string()))?
        } else {
            serde_json::from_str(&contents).map_err(|e| parse_error(e.to_string()))?
        };

        debug!(
            document = %path.display(),
            blocks = document.blocks.len(),
            styles = document.styles.len(),
            "document loaded"
        );
        Ok(document)
    }
}
