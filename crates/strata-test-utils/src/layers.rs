//! [`TestLayers`] builder for merge scenarios.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary directory holding layered source files and the job file
/// that merges them.
///
/// Sources are listed in the job in the order they were added.
///
/// # Example
///
/// ```rust,no_run
/// use strata_test_utils::TestLayers;
///
/// let mut layers = TestLayers::new();
/// layers.add_default("base/items.txt", "sword 10\n");
/// layers.add_override("mods/a/items.txt", "sword 12\n");
/// let job = layers.write_job(
///     "items.toml",
///     "[kind]\nname = \"items\"\n\n[schema]\nfields = [\"word\", \"int\"]\n",
///     "out/items.txt",
/// );
/// assert!(job.exists());
/// ```
pub struct TestLayers {
    temp_dir: TempDir,
    sources: Vec<(String, bool)>,
}

impl Default for TestLayers {
    fn default() -> Self {
        Self::new()
    }
}

impl TestLayers {
    /// Create an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
            sources: Vec::new(),
        }
    }

    /// Return the root path of the temporary directory.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of `path` relative to the root.
    pub fn path(&self, path: &str) -> PathBuf {
        self.root().join(path)
    }

    /// Write `content` to `path` (relative to root), creating parents.
    pub fn write(&self, path: &str, content: &str) -> PathBuf {
        let full_path = self.path(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&full_path, content).unwrap();
        full_path
    }

    /// Write the baseline source and register it as the job's default.
    pub fn add_default(&mut self, path: &str, content: &str) -> PathBuf {
        self.sources.push((path.to_string(), true));
        self.write(path, content)
    }

    /// Write an override source and register it with the job.
    pub fn add_override(&mut self, path: &str, content: &str) -> PathBuf {
        self.sources.push((path.to_string(), false));
        self.write(path, content)
    }

    /// Register a source without writing it, for missing-file scenarios.
    pub fn add_missing(&mut self, path: &str) {
        self.sources.push((path.to_string(), false));
    }

    /// Write a TOML job file at `job_path`.
    ///
    /// `kind_toml` holds the `[kind]`, `[schema]` and `[[sections]]` tables;
    /// `output` and the registered `[[sources]]` are appended.
    pub fn write_job(&self, job_path: &str, kind_toml: &str, output: &str) -> PathBuf {
        let mut job = format!("output = \"{output}\"\n\n{kind_toml}\n");
        for (path, is_default) in &self.sources {
            job.push_str(&format!("\n[[sources]]\npath = \"{path}\"\n"));
            if *is_default {
                job.push_str("default = true\n");
            }
        }
        self.write(job_path, &job)
    }

    /// Read the file at `path` (relative to root).
    ///
    /// # Panics
    /// Panics if the file cannot be read.
    pub fn read(&self, path: &str) -> String {
        let full_path = self.path(path);
        fs::read_to_string(&full_path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", full_path.display()))
    }

    /// Assert that `path` (relative to the root) exists.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_file_exists(&self, path: &str) {
        let full_path = self.path(path);
        assert!(
            full_path.exists(),
            "Expected file to exist: {}",
            full_path.display()
        );
    }

    /// Assert that `path` (relative to the root) does **not** exist.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path exists.
    pub fn assert_file_not_exists(&self, path: &str) {
        let full_path = self.path(path);
        assert!(
            !full_path.exists(),
            "Expected file NOT to exist: {}",
            full_path.display()
        );
    }
}
