//! Normalized path handling for runtime context directories

use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// A path normalized to use forward slashes internally.
///
/// Runtime context paths end up inside YAML documents (the `runtime`
/// section), so they are rendered the same way on every platform. This is
/// a rendering type: filesystem I/O takes native [`Path`]s, since the
/// string form is lossy for non-UTF-8 names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedPath {
    inner: String,
}

impl NormalizedPath {
    /// Create a new NormalizedPath from any path-like input.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path_str = path.as_ref().to_string_lossy();
        Self {
            inner: clean(&to_forward_slashes(&path_str)),
        }
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Join this path with a relative segment.
    pub fn join(&self, segment: &str) -> Self {
        let segment = to_forward_slashes(segment);
        let joined = if self.inner.ends_with('/') {
            format!("{}{}", self.inner, segment)
        } else {
            format!("{}/{}", self.inner, segment)
        };
        Self {
            inner: clean(&joined),
        }
    }

    /// Get the parent directory.
    pub fn parent(&self) -> Option<Self> {
        let trimmed = self.inner.trim_end_matches('/');
        match trimmed.rfind('/') {
            Some(0) => Some(Self {
                inner: "/".to_string(),
            }),
            Some(idx) => Some(Self {
                inner: trimmed[..idx].to_string(),
            }),
            None => None,
        }
    }

    /// Get the file name component.
    pub fn file_name(&self) -> Option<&str> {
        let trimmed = self.inner.trim_end_matches('/');
        trimmed.rsplit('/').next().filter(|name| !name.is_empty())
    }

    /// Get the extension if present.
    pub fn extension(&self) -> Option<&str> {
        self.file_name().and_then(|name| {
            let idx = name.rfind('.')?;
            if idx == 0 { None } else { Some(&name[idx + 1..]) }
        })
    }

    pub fn exists(&self) -> bool {
        self.to_native().exists()
    }

    pub fn is_dir(&self) -> bool {
        self.to_native().is_dir()
    }

    pub fn is_file(&self) -> bool {
        self.to_native().is_file()
    }
}

/// Backslash is a separator only on Windows; elsewhere it is a legal
/// file name character.
fn to_forward_slashes(path: &str) -> String {
    if cfg!(windows) {
        path.replace('\\', "/")
    } else {
        path.to_string()
    }
}

/// Collapse empty and `.` segments, keeping a leading `/`.
fn clean(path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }
    let absolute = path.starts_with('/');
    let parts: Vec<&str> = path
        .split('/')
        .filter(|part| !part.is_empty() && *part != ".")
        .collect();
    let body = parts.join("/");
    match (absolute, body.is_empty()) {
        (true, true) => "/".to_string(),
        (true, false) => format!("/{body}"),
        (false, true) => ".".to_string(),
        (false, false) => body,
    }
}

/// Check that `relative` names a location inside its root.
///
/// Rejects empty paths, absolute paths (including Windows drive prefixes)
/// and paths whose `..` components climb above the root.
pub fn validate_relative(relative: &str) -> Result<()> {
    let invalid = |reason: &str| Error::InvalidRelativePath {
        path: relative.to_string(),
        reason: reason.to_string(),
    };

    let normalized = relative.replace('\\', "/");
    if normalized.trim().is_empty() {
        return Err(invalid("path is empty"));
    }
    let bytes = normalized.as_bytes();
    let has_drive = bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':';
    if normalized.starts_with('/') || has_drive {
        return Err(invalid("path is absolute"));
    }

    let mut depth: usize = 0;
    for part in normalized.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| invalid("path escapes its root"))?;
            }
            _ => depth += 1,
        }
    }
    if depth == 0 {
        return Err(invalid("path resolves to the root itself"));
    }
    Ok(())
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for NormalizedPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<PathBuf> for NormalizedPath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}

impl From<&Path> for NormalizedPath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}
