//! Filesystem layer for tolteca runtime contexts
//!
//! Provides normalized path handling, atomic locked writes and YAML
//! document loading for the directories backing a runtime context.

pub mod document;
pub mod error;
pub mod io;
pub mod path;

pub use document::YamlDocument;
pub use error::{Error, Result};
pub use path::{NormalizedPath, validate_relative};
