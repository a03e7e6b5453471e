//! [`TestProject`] builder for runtime context test scenarios.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Directories of the standard layout, relative to the root.
pub const STANDARD_DIRS: [&str; 3] = ["bin", "cal", "log"];
/// Setup file of the standard layout, relative to the root.
pub const SETUP_FILE: &str = "50_setup.yaml";

/// A temporary directory with helpers for building and inspecting
/// runtime context layouts.
///
/// # Example
///
/// ```rust,no_run
/// use tolteca_test_utils::TestProject;
///
/// let project = TestProject::new().with_standard_layout();
/// project.write("60_local.yaml", "notes: local\n");
/// project.assert_exists("bin");
/// ```
pub struct TestProject {
    temp_dir: TempDir,
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

impl TestProject {
    /// Create an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    /// Return the root path of the temporary directory.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of `relative` under the root.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    /// Create `bin/`, `cal/`, `log/` and an empty `50_setup.yaml` by hand,
    /// without going through the populator.
    pub fn with_standard_layout(self) -> Self {
        for dir in STANDARD_DIRS {
            fs::create_dir_all(self.path(dir)).unwrap();
        }
        fs::write(self.path(SETUP_FILE), "").unwrap();
        self
    }

    /// Write `content` to `relative`, creating parent directories.
    ///
    /// # Panics
    /// Panics if the file cannot be written.
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content)
            .unwrap_or_else(|e| panic!("Could not write {}: {e}", path.display()));
        path
    }

    /// Read `relative` as text.
    ///
    /// # Panics
    /// Panics if the file cannot be read.
    pub fn read(&self, relative: &str) -> String {
        let path = self.path(relative);
        fs::read_to_string(&path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", path.display()))
    }

    /// Names of the entries directly under the root, sorted.
    pub fn entries(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.root())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// Assert that `relative` exists.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_exists(&self, relative: &str) {
        let full_path = self.path(relative);
        assert!(
            full_path.exists(),
            "Expected path to exist: {}",
            full_path.display()
        );
    }

    /// Assert that `relative` does **not** exist.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path exists.
    pub fn assert_not_exists(&self, relative: &str) {
        let full_path = self.path(relative);
        assert!(
            !full_path.exists(),
            "Expected path NOT to exist: {}",
            full_path.display()
        );
    }

    /// Assert that the file at `relative` contains `content`.
    ///
    /// # Panics
    /// Panics if the file cannot be read or does not contain `content`.
    pub fn assert_file_contains(&self, relative: &str, content: &str) {
        let file_content = self.read(relative);
        assert!(
            file_content.contains(content),
            "File {relative} does not contain expected content.\nExpected: {content}\nActual: {file_content}"
        );
    }
}
