//! Error types for tolteca-fs

use std::path::PathBuf;

/// Result type for tolteca-fs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in tolteca-fs operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {format} document at {path}: {message}")]
    ConfigParse {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("Failed to serialize {format} document for {path}: {message}")]
    ConfigSerialize {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("Unsupported document format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("Invalid relative path '{path}': {reason}")]
    InvalidRelativePath { path: String, reason: String },

    #[error("Lock acquisition failed for {path}")]
    LockFailed { path: PathBuf },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True when this is an I/O error caused by a missing file.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}
