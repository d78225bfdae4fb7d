//! In-memory doubles for the service and store traits

use chrono::NaiveDateTime;
use parking_lot::Mutex;
use s3_backup::artifact;
use s3_backup::error::{Error, Result};
use s3_backup::services::Service;
use s3_backup::stores::Store;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Store keeping artifacts in memory, keyed by file name
pub struct MockStore {
    save_dir: PathBuf,
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
    fail_uploads: bool,
}

impl MockStore {
    pub fn new(save_dir: impl Into<PathBuf>) -> Self {
        Self {
            save_dir: save_dir.into(),
            objects: Mutex::new(BTreeMap::new()),
            fail_uploads: false,
        }
    }

    /// Every upload fails with a transfer error
    pub fn failing(save_dir: impl Into<PathBuf>) -> Self {
        Self {
            fail_uploads: true,
            ..Self::new(save_dir)
        }
    }

    /// Seed an object
    pub fn insert(&self, key: &str, contents: &[u8]) {
        self.objects.lock().insert(key.to_string(), contents.to_vec());
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().keys().cloned().collect()
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().get(key).cloned()
    }
}

fn transfer(key: &str, message: impl ToString) -> Error {
    Error::StoreTransfer {
        store: "mock",
        key: key.to_string(),
        message: message.to_string(),
    }
}

impl Store for MockStore {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn upload(&self, artifact: &Path) -> Result<()> {
        let key = artifact
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self.fail_uploads {
            return Err(transfer(&key, "upload rejected"));
        }

        let contents = fs::read(artifact).map_err(|e| transfer(&key, e))?;
        self.objects.lock().insert(key, contents);
        Ok(())
    }

    fn fetch(&self, key: &str) -> Result<PathBuf> {
        let contents = self
            .get(key)
            .ok_or_else(|| transfer(key, "no such object"))?;

        fs::create_dir_all(&self.save_dir).map_err(|e| transfer(key, e))?;
        let dest = self.save_dir.join(key);
        fs::write(&dest, contents).map_err(|e| transfer(key, e))?;
        Ok(dest)
    }

    fn latest(&self, logical: &str) -> Result<Option<String>> {
        let objects = self.objects.lock();
        Ok(artifact::newest(logical, objects.keys().map(String::as_str)).map(str::to_string))
    }
}

/// Service writing a fixed payload and recording what it restored
pub struct MockService {
    logical: String,
    save_dir: PathBuf,
    payload: String,
    fail_backup: bool,
    restored: Mutex<Vec<(PathBuf, String)>>,
}

impl MockService {
    pub fn new(logical: &str, save_dir: impl Into<PathBuf>) -> Self {
        Self {
            logical: logical.to_string(),
            save_dir: save_dir.into(),
            payload: format!("{} payload", logical),
            fail_backup: false,
            restored: Mutex::new(Vec::new()),
        }
    }

    /// Backups fail like a dump tool exiting non-zero
    pub fn failing(logical: &str, save_dir: impl Into<PathBuf>) -> Self {
        Self {
            fail_backup: true,
            ..Self::new(logical, save_dir)
        }
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Artifact paths restored so far with the contents seen
    pub fn restored(&self) -> Vec<(PathBuf, String)> {
        self.restored.lock().clone()
    }
}

impl Service for MockService {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn artifact_prefix(&self) -> String {
        self.logical.clone()
    }

    fn backup_at(&self, timestamp: NaiveDateTime) -> Result<PathBuf> {
        if self.fail_backup {
            return Err(Error::ExternalTool {
                tool: "mock-dump".to_string(),
                status: "exit code 2".to_string(),
                stderr: "connection refused".to_string(),
            });
        }

        fs::create_dir_all(&self.save_dir)
            .map_err(|e| Error::ExternalTool {
                tool: "mock-dump".to_string(),
                status: "i/o".to_string(),
                stderr: e.to_string(),
            })?;
        let path = self
            .save_dir
            .join(artifact::artifact_name(&self.logical, timestamp, ".txt"));
        fs::write(&path, &self.payload).map_err(|e| Error::ExternalTool {
            tool: "mock-dump".to_string(),
            status: "i/o".to_string(),
            stderr: e.to_string(),
        })?;
        Ok(path)
    }

    fn restore(&self, artifact: &Path) -> Result<()> {
        let contents = fs::read_to_string(artifact).map_err(|e| Error::ExternalTool {
            tool: "mock-restore".to_string(),
            status: "i/o".to_string(),
            stderr: e.to_string(),
        })?;
        self.restored.lock().push((artifact.to_path_buf(), contents));
        Ok(())
    }
}
