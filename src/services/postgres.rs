//! Postgres service
//!
//! Plain dumps come from `pg_dump` (or `pg_dumpall` without a database) and
//! are restored through `psql`. Custom-format dumps are always compressed by
//! `pg_dump` itself, use the `.dump` extension and are restored with
//! `pg_restore`.

use super::{ensure_save_dir, push_flag, Service, ALL_DATABASES};
use crate::artifact;
use crate::config::PostgresConfig;
use crate::error::Result;
use crate::utils::executor::{check, CommandExecutor, Invocation};
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

pub const DUMP_TOOL: &str = "pg_dump";
pub const DUMP_ALL_TOOL: &str = "pg_dumpall";
pub const RESTORE_TOOL: &str = "psql";
pub const CUSTOM_RESTORE_TOOL: &str = "pg_restore";

pub const CUSTOM_EXTENSION: &str = ".dump";

pub struct PostgresService {
    config: PostgresConfig,
    executor: Arc<dyn CommandExecutor>,
}

impl PostgresService {
    pub fn new(config: PostgresConfig, executor: Arc<dyn CommandExecutor>) -> Self {
        Self { config, executor }
    }

    /// Custom format needs a single database to dump
    fn custom_format(&self) -> bool {
        self.config.custom && !self.config.database.is_empty()
    }

    fn connection_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        push_flag(&mut args, "-h", &self.config.host);
        push_flag(&mut args, "-p", &self.config.port);
        push_flag(&mut args, "-U", &self.config.user);
        args
    }

    fn with_password(&self, invocation: Invocation) -> Invocation {
        if self.config.password.is_empty() {
            invocation
        } else {
            invocation.env("PGPASSWORD", self.config.password.expose())
        }
    }

    fn restore_database(&self) -> &str {
        if self.config.database.is_empty() {
            "postgres"
        } else {
            &self.config.database
        }
    }
}

impl Service for PostgresService {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn artifact_prefix(&self) -> String {
        if self.config.database.is_empty() {
            ALL_DATABASES.to_string()
        } else {
            self.config.database.clone()
        }
    }

    fn backup_at(&self, timestamp: NaiveDateTime) -> Result<PathBuf> {
        ensure_save_dir(&self.config.save_dir)?;

        if self.config.custom && self.config.database.is_empty() {
            warn!("Custom format ignored: no database name set");
        }

        let custom = self.custom_format();
        let (extension, gzip) = if custom {
            (CUSTOM_EXTENSION.to_string(), false)
        } else {
            (
                artifact::extension(".sql", self.config.compress),
                self.config.compress,
            )
        };

        let path = self
            .config
            .save_dir
            .join(artifact::artifact_name(&self.artifact_prefix(), timestamp, &extension));

        let tool = if self.config.database.is_empty() {
            DUMP_ALL_TOOL
        } else {
            DUMP_TOOL
        };

        let mut invocation = Invocation::new(tool)
            .args(self.connection_args())
            .args(self.config.options.iter().cloned());
        if custom {
            invocation = invocation.arg("-Fc");
        }
        if !self.config.database.is_empty() {
            invocation = invocation.arg(self.config.database.clone());
        }
        let invocation = self.with_password(invocation).stdout_to(&path, gzip);

        info!("Dumping Postgres into {:?}", path);
        let completion = self.executor.execute(&invocation)?;
        check(tool, completion, false)?;

        Ok(path)
    }

    fn restore(&self, artifact: &Path) -> Result<()> {
        let custom = artifact.to_string_lossy().ends_with(CUSTOM_EXTENSION);
        let tool = if custom { CUSTOM_RESTORE_TOOL } else { RESTORE_TOOL };

        let invocation = Invocation::new(tool)
            .args(self.connection_args())
            .args(self.config.options.iter().cloned())
            .args(["-d", self.restore_database()]);
        let invocation = self
            .with_password(invocation)
            .stdin_from(artifact, !custom && artifact::is_gzip(artifact));

        info!("Restoring Postgres from {:?} with {}", artifact, tool);
        let completion = self.executor.execute(&invocation)?;
        check(tool, completion, self.config.ignore_exit_code)
    }
}
