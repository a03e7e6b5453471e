//! Error types for tolteca-core

use std::path::PathBuf;

use crate::contents::ContentKind;

/// Result type for tolteca-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in tolteca-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Conflicting or missing constructor arguments, or an unusable root
    #[error("Cannot construct runtime context: {message}")]
    Construction { message: String },

    /// Root path is absent or not a directory
    #[error("Runtime context root {path} does not exist or is not a directory")]
    MissingRoot { path: PathBuf },

    /// Declared content items are absent
    #[error(
        "Missing runtime context contents in {root}: {}. Use RuntimeContext::from_dir with create enabled instead",
        .missing.join(", ")
    )]
    MissingContent { root: PathBuf, missing: Vec<String> },

    /// A content item exists with the wrong kind
    #[error("Content item '{name}' at {path} is not a {expected}")]
    ContentKindMismatch {
        name: String,
        path: PathBuf,
        expected: ContentKind,
    },

    /// Content descriptor table is malformed
    #[error("Invalid content table: {message}")]
    InvalidContentTable { message: String },

    /// Configuration failed schema validation
    #[error("Invalid config at '{path}': {message}")]
    Validation { path: String, message: String },

    /// `setup` called on an initialized context without overwrite
    #[error("Runtime context is already set up ({path})")]
    AlreadySetUp { path: PathBuf },

    /// Operation requires a root path on disk
    #[error("Runtime context is not persistent: {operation} requires a root path")]
    NotPersistent { operation: String },

    /// Name not declared in the content table
    #[error("Unknown content item: {name}")]
    UnknownContent { name: String },

    /// Content item has no path in a non-persistent context
    #[error("Content item '{name}' has no path in this runtime context")]
    ContentUnavailable { name: String },

    /// Symlink source without a usable file name
    #[error("Cannot derive a link name from {path}")]
    InvalidLinkSource { path: PathBuf },

    /// A link name that is not a single file name
    #[error("Invalid link name '{name}': expected a single file name")]
    InvalidLinkName { name: String },

    /// Filesystem error from tolteca-fs
    #[error(transparent)]
    Fs(#[from] tolteca_fs::Error),

    /// YAML conversion error
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    pub(crate) fn validation(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            path: path.into(),
            message: message.into(),
        }
    }
}
