//! Tarball service: archives an arbitrary directory

use super::{ensure_save_dir, Service};
use crate::artifact;
use crate::config::{ConfigError, TarballConfig};
use crate::error::Result;
use crate::utils::archive::{self, Member};
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use tracing::info;

pub struct TarballService {
    config: TarballConfig,
}

impl TarballService {
    pub fn new(config: TarballConfig) -> Self {
        Self { config }
    }

    fn logical_name(&self) -> Result<String> {
        if !self.config.name.is_empty() {
            return Ok(self.config.name.clone());
        }

        self.config
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                ConfigError::InvalidValue {
                    option: "tarball-path".to_string(),
                    value: self.config.path.display().to_string(),
                    reason: "no final path segment to name the artifact; set tarball-name"
                        .to_string(),
                }
                .into()
            })
    }
}

impl Service for TarballService {
    fn name(&self) -> &'static str {
        "tarball"
    }

    fn artifact_prefix(&self) -> String {
        self.logical_name().unwrap_or_default()
    }

    fn backup_at(&self, timestamp: NaiveDateTime) -> Result<PathBuf> {
        ensure_save_dir(&self.config.save_dir)?;

        let name = artifact::artifact_name(
            &self.logical_name()?,
            timestamp,
            &artifact::extension(".tar", self.config.compress),
        );
        let path = self.config.save_dir.join(name);

        info!("Archiving {:?} into {:?}", self.config.path, path);
        archive::create(
            &path,
            &[Member::new(&self.config.path, "")],
            self.config.compress,
        )?;

        Ok(path)
    }

    fn restore(&self, artifact: &Path) -> Result<()> {
        info!("Unpacking {:?} into {:?}", artifact, self.config.path);
        archive::extract(artifact, &self.config.path, artifact::is_gzip(artifact))
    }
}
