//! Test context for resolving configuration against a scratch directory

use s3_backup::config::{FileOverlay, FlagValues, Resolver};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Temporary directory plus the option values a test wants resolved
pub struct TestContext {
    temp_dir: TempDir,
    flags: FlagValues,
    env: HashMap<String, String>,
    file: FileOverlay,
}

impl TestContext {
    /// New context whose `savedir` points into the temporary directory
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let mut flags = FlagValues::new();
        flags.insert(
            "savedir".to_string(),
            temp_dir.path().join("save").display().to_string(),
        );

        Self {
            temp_dir,
            flags,
            env: HashMap::new(),
            file: FileOverlay::new(),
        }
    }

    /// Set an option as if given on the command line
    pub fn with(mut self, name: &str, value: impl AsRef<str>) -> Self {
        self.flags
            .insert(name.to_string(), value.as_ref().to_string());
        self
    }

    /// Set an option by path, relative to the temp dir
    pub fn with_path(self, name: &str, relative: &str) -> Self {
        let path = self.temp_dir.path().join(relative);
        self.with(name, path.display().to_string())
    }

    /// Set an environment variable seen by the resolver
    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    /// Set a config file entry seen by the resolver
    pub fn with_file_value(mut self, name: &str, value: &str) -> Self {
        self.file.insert(name.to_string(), value.to_string());
        self
    }

    pub fn resolver(&self) -> Resolver {
        Resolver::new(self.flags.clone(), self.env.clone(), self.file.clone())
    }

    /// Get the temporary directory path
    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn save_dir(&self) -> PathBuf {
        self.temp_dir.path().join("save")
    }

    /// Path inside the temp dir, not created
    pub fn path(&self, relative: &str) -> PathBuf {
        self.temp_dir.path().join(relative)
    }

    /// Create a subdirectory in the temp dir
    pub fn create_subdir(&self, name: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        std::fs::create_dir_all(&path).expect("Failed to create subdirectory");
        path
    }

    /// Create a file in the temp dir
    pub fn create_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&path, content).expect("Failed to write file");
        path
    }

    pub fn read_file(&self, name: &str) -> anyhow::Result<String> {
        Ok(std::fs::read_to_string(self.temp_dir.path().join(name))?)
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Extension trait for assertion helpers
pub trait ResultAssertions<T> {
    /// Assert that the result is Ok and return the value
    fn assert_ok(self) -> T;

    /// Assert that the result is Err and its message contains `needle`
    fn assert_err_contains(self, needle: &str);
}

impl<T: std::fmt::Debug, E: std::fmt::Display> ResultAssertions<T> for Result<T, E> {
    fn assert_ok(self) -> T {
        match self {
            Ok(v) => v,
            Err(e) => panic!("Expected Ok, got Err: {}", e),
        }
    }

    fn assert_err_contains(self, needle: &str) {
        match self {
            Ok(v) => panic!("Expected Err containing '{}', got Ok: {:?}", needle, v),
            Err(e) => {
                let err_msg = e.to_string();
                assert!(
                    err_msg.contains(needle),
                    "Error '{}' does not contain '{}'",
                    err_msg,
                    needle
                );
            }
        }
    }
}
