//! Gogs service
//!
//! The artifact is a gzip tar holding the Gogs config file under `config/`
//! and the data directory under `data/`.

use super::{ensure_save_dir, Service};
use crate::artifact;
use crate::config::GogsConfig;
use crate::error::{Error, Result};
use crate::utils::archive::{self, Member};
use chrono::NaiveDateTime;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const LOGICAL_NAME: &str = "gogs";
const CONFIG_DIR: &str = "config";
const DATA_DIR: &str = "data";

pub struct GogsService {
    config: GogsConfig,
}

impl GogsService {
    pub fn new(config: GogsConfig) -> Self {
        Self { config }
    }

    fn members(&self) -> Vec<Member> {
        let mut members = Vec::new();

        if let Some(ref config_path) = self.config.config_path {
            let file_name = config_path
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("app.ini"));
            members.push(Member::new(config_path, Path::new(CONFIG_DIR).join(file_name)));
        } else {
            warn!("No Gogs config path set, backing up the data directory only");
        }

        members.push(Member::new(&self.config.data_path, DATA_DIR));
        members
    }

    /// Where an archive entry is written back to, `None` for foreign entries
    fn destination(&self, entry: &Path) -> Option<PathBuf> {
        if let Ok(rest) = entry.strip_prefix(DATA_DIR) {
            return Some(self.config.data_path.join(rest));
        }

        if let Ok(rest) = entry.strip_prefix(CONFIG_DIR) {
            if rest.as_os_str().is_empty() {
                return None;
            }
            return self.config.config_path.clone();
        }

        None
    }
}

impl Service for GogsService {
    fn name(&self) -> &'static str {
        "gogs"
    }

    fn artifact_prefix(&self) -> String {
        LOGICAL_NAME.to_string()
    }

    fn backup_at(&self, timestamp: NaiveDateTime) -> Result<PathBuf> {
        ensure_save_dir(&self.config.save_dir)?;

        let path = self.config.save_dir.join(artifact::artifact_name(
            LOGICAL_NAME,
            timestamp,
            &artifact::extension(".tar", true),
        ));

        info!("Archiving Gogs data {:?} into {:?}", self.config.data_path, path);
        archive::create(&path, &self.members(), true)?;

        Ok(path)
    }

    fn restore(&self, artifact: &Path) -> Result<()> {
        info!("Restoring Gogs from {:?}", artifact);

        fs::create_dir_all(&self.config.data_path)
            .map_err(|e| Error::archive(&self.config.data_path, e))?;

        let mut reader = archive::open(artifact, artifact::is_gzip(artifact))?;
        let entries = reader.entries().map_err(|e| Error::archive(artifact, e))?;

        for entry in entries {
            let mut entry = entry.map_err(|e| Error::archive(artifact, e))?;
            let entry_path = entry
                .path()
                .map_err(|e| Error::archive(artifact, e))?
                .into_owned();
            archive::ensure_relative(artifact, &entry_path)?;

            let Some(dest) = self.destination(&entry_path) else {
                if entry_path.starts_with(CONFIG_DIR) {
                    debug!("Skipping {:?}: no Gogs config path set", entry_path);
                } else {
                    warn!("Skipping unexpected entry {:?}", entry_path);
                }
                continue;
            };

            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).map_err(|e| Error::archive(parent, e))?;
            }
            entry.unpack(&dest).map_err(|e| Error::archive(&dest, e))?;
        }

        Ok(())
    }
}
