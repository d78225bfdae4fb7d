//! Filesystem store: copies artifacts to and from a local directory

use super::{file_name, Store};
use crate::artifact;
use crate::config::FilesystemConfig;
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const STORE: &str = "filesystem";

pub struct FilesystemStore {
    config: FilesystemConfig,
}

impl FilesystemStore {
    pub fn new(config: FilesystemConfig) -> Self {
        Self { config }
    }

    fn copy(&self, from: &Path, to: &Path, key: &str) -> Result<()> {
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::transfer(STORE, key, e))?;
        }

        if same_file(from, to) {
            debug!("{:?} is already in place", to);
            return Ok(());
        }

        fs::copy(from, to).map_err(|e| {
            Error::transfer(STORE, key, format!("copy {:?} -> {:?}: {}", from, to, e))
        })?;
        Ok(())
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

impl Store for FilesystemStore {
    fn name(&self) -> &'static str {
        STORE
    }

    fn upload(&self, artifact: &Path) -> Result<()> {
        let key = file_name(artifact).ok_or_else(|| {
            Error::transfer(STORE, artifact.display().to_string(), "artifact has no file name")
        })?;
        let dest = self.config.path.join(&key);

        info!("Copying {:?} to {:?}", artifact, dest);
        self.copy(artifact, &dest, &key)
    }

    fn fetch(&self, key: &str) -> Result<PathBuf> {
        let source = self.config.path.join(key);
        let name = file_name(&source)
            .ok_or_else(|| Error::transfer(STORE, key, "key has no file name"))?;
        let dest = self.config.save_dir.join(name);

        info!("Copying {:?} to {:?}", source, dest);
        self.copy(&source, &dest, key)?;
        Ok(dest)
    }

    fn latest(&self, logical: &str) -> Result<Option<String>> {
        let entries = match fs::read_dir(&self.config.path) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::transfer(STORE, artifact::prefix_for(logical), e)),
        };

        let names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();

        Ok(artifact::newest(logical, names.iter().map(String::as_str)).map(str::to_string))
    }
}
