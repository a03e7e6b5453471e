//! Config file discovery and loading
//!
//! Config files live directly under a context root and are named
//! `<digits>_<name>.yaml` (or `.yml`). They are merged in file name order,
//! so `60_local.yaml` overrides `50_setup.yaml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde_yaml::Mapping;
use tolteca_fs::YamlDocument;

use crate::merge::rupdate_mapping;
use crate::schema::Validator;
use crate::Result;

static CONFIG_FILE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+_.+\.ya?ml$").expect("config file pattern is valid"));

/// True if `file_name` follows the numbered config file convention.
pub fn is_config_file_name(file_name: &str) -> bool {
    CONFIG_FILE_PATTERN.is_match(file_name)
}

/// List config files under `root`, sorted by file name.
///
/// Sorting compares file names as strings, which gives a total order
/// independent of directory enumeration order.
pub fn collect_config_files(root: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(root).map_err(|e| tolteca_fs::Error::io(root, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| tolteca_fs::Error::io(root, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let path = entry.path();
        if is_config_file_name(&name) && path.is_file() {
            files.push((name, path));
        }
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));

    let files: Vec<PathBuf> = files.into_iter().map(|(_, path)| path).collect();
    tracing::debug!(root = %root.display(), count = files.len(), ?files, "collected config files");
    Ok(files)
}

/// Load `files` in order and merge them into one mapping.
///
/// When a validator is given the merged mapping is validated before it is
/// returned. Parse errors name the offending file.
pub fn collect_config_from_files(
    files: &[PathBuf],
    validator: Option<&Validator>,
) -> Result<Mapping> {
    let mut merged = Mapping::new();
    for file in files {
        let document = YamlDocument::load(file)?;
        tracing::trace!(file = %file.display(), keys = document.len(), "merging config file");
        rupdate_mapping(&mut merged, &document);
    }
    match validator {
        Some(validator) => validator.validate(merged),
        None => Ok(merged),
    }
}
