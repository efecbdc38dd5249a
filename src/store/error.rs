//! Error types for artifact persistence.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or saving an artifact.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The primary file does not exist.
    #[error("file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// YAML content does not deserialize.
    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// JSON content does not deserialize.
    #[error("malformed JSON in {}: {message}", path.display())]
    MalformedJson { path: PathBuf, message: String },

    /// Refused to save a null or empty document.
    #[error("refusing to save an empty document to {}", path.display())]
    EmptyDocument { path: PathBuf },

    /// I/O failure during directory creation, read, backup or write.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document could not be rendered in the artifact's format.
    #[error("failed to serialize document for {}: {message}", path.display())]
    Serialization { path: PathBuf, message: String },
}

impl StoreError {
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }

    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn malformed_json(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::MalformedJson {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn empty_document(path: impl Into<PathBuf>) -> Self {
        Self::EmptyDocument { path: path.into() }
    }

    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn serialization(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Serialization {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Convenience type alias for store results.
pub type StoreResult<T> = Result<T, StoreError>;
