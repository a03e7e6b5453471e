//! YAML document loading and saving
//!
//! Runtime context config files are human-edited YAML documents whose top
//! level is a mapping. Empty documents are treated as empty mappings so a
//! freshly created setup file loads cleanly.

use std::path::Path;

use serde_yaml::{Mapping, Value};

use crate::{Error, Result, io};

const FORMAT: &str = "YAML";

/// Loader and writer for YAML config documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct YamlDocument;

impl YamlDocument {
    /// Parse a document without constraining its top-level shape.
    ///
    /// Empty and comment-only files load as `Value::Null`.
    pub fn load_raw(path: &Path) -> Result<Value> {
        check_extension(path)?;
        let content = io::read_text(path)?;
        if content.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_yaml::from_str(&content).map_err(|e| Error::ConfigParse {
            path: path.to_path_buf(),
            format: FORMAT.into(),
            message: e.to_string(),
        })
    }

    /// Load a document whose top level must be a mapping.
    pub fn load(path: &Path) -> Result<Mapping> {
        match Self::load_raw(path)? {
            Value::Null => Ok(Mapping::new()),
            Value::Mapping(mapping) => Ok(mapping),
            other => Err(Error::ConfigParse {
                path: path.to_path_buf(),
                format: FORMAT.into(),
                message: format!(
                    "expected a mapping at the top level, found {}",
                    kind_of(&other)
                ),
            }),
        }
    }

    /// Serialize `mapping` and write it atomically to `path`.
    pub fn save(path: &Path, mapping: &Mapping) -> Result<()> {
        check_extension(path)?;
        let content = serde_yaml::to_string(mapping).map_err(|e| Error::ConfigSerialize {
            path: path.to_path_buf(),
            format: FORMAT.into(),
            message: e.to_string(),
        })?;
        io::write_text(path, &content)
    }
}

fn check_extension(path: &Path) -> Result<()> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy())
        .unwrap_or_default();
    match extension.to_lowercase().as_str() {
        "yaml" | "yml" => Ok(()),
        _ => Err(Error::UnsupportedFormat {
            extension: extension.to_string(),
        }),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
