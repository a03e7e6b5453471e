//! Content descriptor table and directory populator
//!
//! A content table declares the named files and directories that make up a
//! runtime context directory. `populate_dir` creates or checks them.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tolteca_fs::{io, validate_relative};

use crate::{Error, Result};

/// Content name of the directory holding symlinked executables.
pub const BINDIR: &str = "bindir";
/// Content name of the calibration data directory.
pub const CALDIR: &str = "caldir";
/// Content name of the log directory.
pub const LOGDIR: &str = "logdir";
/// Content name of the primary setup file.
pub const SETUP_FILE: &str = "setup_file";

/// Whether a content item is a directory or a regular file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Dir,
    File,
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dir => write!(f, "directory"),
            Self::File => write!(f, "file"),
        }
    }
}

/// A named path relative to a runtime context root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDescriptor {
    pub name: String,
    pub relative_path: String,
    pub kind: ContentKind,
    pub backup_enabled: bool,
}

impl ContentDescriptor {
    pub fn dir(name: impl Into<String>, relative_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            relative_path: relative_path.into(),
            kind: ContentKind::Dir,
            backup_enabled: false,
        }
    }

    pub fn file(name: impl Into<String>, relative_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            relative_path: relative_path.into(),
            kind: ContentKind::File,
            backup_enabled: false,
        }
    }

    pub fn with_backup(mut self, enabled: bool) -> Self {
        self.backup_enabled = enabled;
        self
    }

    fn matches_kind(&self, path: &Path) -> bool {
        match self.kind {
            ContentKind::Dir => path.is_dir(),
            ContentKind::File => path.is_file(),
        }
    }
}

/// Ordered, validated set of content descriptors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentTable {
    items: Vec<ContentDescriptor>,
}

impl ContentTable {
    /// Build a table, rejecting duplicate names and paths that leave the root.
    pub fn new(items: Vec<ContentDescriptor>) -> Result<Self> {
        let mut seen = HashSet::new();
        for item in &items {
            if item.name.is_empty() {
                return Err(Error::InvalidContentTable {
                    message: "content names must not be empty".to_string(),
                });
            }
            if !seen.insert(item.name.as_str()) {
                return Err(Error::InvalidContentTable {
                    message: format!("duplicate content name '{}'", item.name),
                });
            }
            validate_relative(&item.relative_path).map_err(|e| Error::InvalidContentTable {
                message: format!("content '{}': {e}", item.name),
            })?;
        }
        Ok(Self { items })
    }

    /// The standard Toltec runtime context layout.
    pub fn toltec() -> Self {
        Self {
            items: vec![
                ContentDescriptor::dir(BINDIR, "bin"),
                ContentDescriptor::dir(CALDIR, "cal"),
                ContentDescriptor::dir(LOGDIR, "log"),
                ContentDescriptor::file(SETUP_FILE, "50_setup.yaml").with_backup(true),
            ],
        }
    }

    pub fn get(&self, name: &str) -> Option<&ContentDescriptor> {
        self.items.iter().find(|item| item.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContentDescriptor> {
        self.items.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|item| item.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items that should be backed up before being overwritten.
    pub fn backup_enabled(&self) -> impl Iterator<Item = &ContentDescriptor> {
        self.items.iter().filter(|item| item.backup_enabled)
    }

    /// Absolute path of content `name` under `root`.
    pub fn resolve(&self, root: &Path, name: &str) -> Option<PathBuf> {
        self.get(name).map(|item| root.join(&item.relative_path))
    }
}

impl Default for ContentTable {
    fn default() -> Self {
        Self::toltec()
    }
}

/// Options for [`populate_dir`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PopulateOptions {
    /// Create the root and any missing content items.
    pub create: bool,
    /// Accept the root even when content items are missing.
    pub force: bool,
}

impl PopulateOptions {
    pub fn create() -> Self {
        Self {
            create: true,
            force: false,
        }
    }

    pub fn force() -> Self {
        Self {
            create: false,
            force: true,
        }
    }
}

/// A canonical runtime context root directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RootPath(PathBuf);

impl RootPath {
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn join(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.0.join(relative)
    }

    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }
}

impl AsRef<Path> for RootPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for RootPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Ensure the items of `table` exist under `root`.
///
/// With `create`, missing directories are created and missing files are
/// created empty; existing items are left alone. Without `create`, every
/// item must already exist unless `force` is set, in which case missing
/// items are only reported as a warning. A missing root and an item of the
/// wrong kind are errors in every mode.
pub fn populate_dir(
    table: &ContentTable,
    root: impl AsRef<Path>,
    options: PopulateOptions,
) -> Result<RootPath> {
    let root = root.as_ref();
    if !root.is_dir() {
        if root.exists() || !options.create {
            return Err(Error::MissingRoot {
                path: root.to_path_buf(),
            });
        }
        fs::create_dir_all(root).map_err(|e| tolteca_fs::Error::io(root, e))?;
        tracing::debug!(root = %root.display(), "created runtime context root");
    }
    let root = dunce::canonicalize(root).map_err(|e| tolteca_fs::Error::io(root, e))?;

    let mut missing = Vec::new();
    for item in table.iter() {
        let path = root.join(&item.relative_path);
        if path.exists() {
            if !item.matches_kind(&path) {
                return Err(Error::ContentKindMismatch {
                    name: item.name.clone(),
                    path,
                    expected: item.kind,
                });
            }
            continue;
        }
        if !options.create {
            missing.push(item.name.clone());
            continue;
        }
        match item.kind {
            ContentKind::Dir => {
                fs::create_dir_all(&path).map_err(|e| tolteca_fs::Error::io(&path, e))?;
            }
            ContentKind::File => {
                io::touch(&path)?;
            }
        }
        tracing::debug!(name = %item.name, path = %path.display(), kind = %item.kind, "created content");
    }

    if !missing.is_empty() {
        if !options.force {
            return Err(Error::MissingContent { root, missing });
        }
        tracing::warn!(
            root = %root.display(),
            missing = %missing.join(", "),
            "accepting runtime context root with missing contents"
        );
    }
    Ok(RootPath(root))
}
