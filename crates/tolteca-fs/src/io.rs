//! Atomic I/O operations with file locking

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::{Error, Result};

/// Write content atomically to a file with locking.
///
/// Uses write-to-temp-then-rename in the target directory so readers never
/// observe a partially written file. The advisory lock only covers the temp
/// file; it does not serialize competing writers of the target.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let temp_name = format!(
        ".{}.{}.tmp",
        path.file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp_path = path.with_file_name(&temp_name);

    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .map_err(|e| Error::io(&temp_path, e))?;

    temp_file.lock_exclusive().map_err(|_| Error::LockFailed {
        path: path.to_path_buf(),
    })?;

    temp_file
        .write_all(content)
        .map_err(|e| Error::io(&temp_path, e))?;
    temp_file.sync_all().map_err(|e| Error::io(&temp_path, e))?;

    temp_file.unlock().map_err(|_| Error::LockFailed {
        path: path.to_path_buf(),
    })?;

    fs::rename(&temp_path, path).map_err(|e| Error::io(path, e))?;

    tracing::trace!(path = %path.display(), bytes = content.len(), "atomic write");
    Ok(())
}

/// Read text content from a file.
pub fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::io(path, e))
}

/// Write text content to a file atomically.
pub fn write_text(path: &Path, content: &str) -> Result<()> {
    write_atomic(path, content.as_bytes())
}

/// Create an empty file if nothing exists at `path`.
///
/// Existing files are left untouched. Returns `true` when a file was created.
pub fn touch(path: &Path) -> Result<bool> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
    {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(Error::io(path, e)),
    }
}

/// Copy a file to a sibling named `<file name>.<suffix>.bak`.
///
/// An existing backup is never replaced: a counter is appended to the
/// suffix until the name is free. Returns the path of the copy.
pub fn copy_to_backup(path: &Path, suffix: &str) -> Result<PathBuf> {
    let file_name = path.file_name().ok_or_else(|| {
        Error::io(
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
        )
    })?;

    let mut attempt = 0u32;
    loop {
        let mut backup_name = file_name.to_os_string();
        if attempt == 0 {
            backup_name.push(format!(".{suffix}.bak"));
        } else {
            backup_name.push(format!(".{suffix}-{attempt}.bak"));
        }
        let backup = path.with_file_name(backup_name);

        // create_new claims the name so a concurrent backup cannot take it
        match OpenOptions::new().write(true).create_new(true).open(&backup) {
            Ok(_) => {
                fs::copy(path, &backup).map_err(|e| Error::io(path, e))?;
                tracing::debug!(from = %path.display(), to = %backup.display(), "backed up file");
                return Ok(backup);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(Error::io(&backup, e)),
        }
    }
}

/// Create a symbolic link at `link` pointing to `target`.
pub fn symlink(target: &Path, link: &Path) -> Result<()> {
    #[cfg(unix)]
    let result = std::os::unix::fs::symlink(target, link);
    #[cfg(windows)]
    let result = if target.is_dir() {
        std::os::windows::fs::symlink_dir(target, link)
    } else {
        std::os::windows::fs::symlink_file(target, link)
    };
    result.map_err(|e| Error::io(link, e))
}
