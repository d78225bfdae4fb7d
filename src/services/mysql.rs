//! MySQL service
//!
//! Dumps with `mysqldump` and restores by streaming the artifact into `mysql`.
//! The password travels in `MYSQL_PWD`, never on the command line.

use super::{ensure_save_dir, push_flag, Service, ALL_DATABASES};
use crate::artifact;
use crate::config::MysqlConfig;
use crate::error::Result;
use crate::utils::executor::{check, CommandExecutor, Invocation};
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

pub const DUMP_TOOL: &str = "mysqldump";
pub const RESTORE_TOOL: &str = "mysql";

pub struct MysqlService {
    config: MysqlConfig,
    executor: Arc<dyn CommandExecutor>,
}

impl MysqlService {
    pub fn new(config: MysqlConfig, executor: Arc<dyn CommandExecutor>) -> Self {
        Self { config, executor }
    }

    fn connection_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        push_flag(&mut args, "-h", &self.config.host);
        push_flag(&mut args, "-P", &self.config.port);
        push_flag(&mut args, "-u", &self.config.user);
        args
    }

    fn with_password(&self, invocation: Invocation) -> Invocation {
        if self.config.password.is_empty() {
            invocation
        } else {
            invocation.env("MYSQL_PWD", self.config.password.expose())
        }
    }
}

impl Service for MysqlService {
    fn name(&self) -> &'static str {
        "mysql"
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

        let name = artifact::artifact_name(
            &self.artifact_prefix(),
            timestamp,
            &artifact::extension(".sql", self.config.compress),
        );
        let path = self.config.save_dir.join(name);

        let target = if self.config.database.is_empty() {
            "--all-databases".to_string()
        } else {
            self.config.database.clone()
        };

        let invocation = Invocation::new(DUMP_TOOL)
            .args(self.connection_args())
            .args(self.config.options.iter().cloned())
            .arg(target)
            .stdout_to(&path, self.config.compress);
        let invocation = self.with_password(invocation);

        info!("Dumping MySQL into {:?}", path);
        let completion = self.executor.execute(&invocation)?;
        check(DUMP_TOOL, completion, false)?;

        Ok(path)
    }

    fn restore(&self, artifact: &Path) -> Result<()> {
        let mut invocation = Invocation::new(RESTORE_TOOL)
            .args(self.connection_args())
            .args(self.config.options.iter().cloned());
        if !self.config.database.is_empty() {
            invocation = invocation.arg(self.config.database.clone());
        }
        let invocation = self
            .with_password(invocation)
            .stdin_from(artifact, artifact::is_gzip(artifact));

        info!("Restoring MySQL from {:?}", artifact);
        let completion = self.executor.execute(&invocation)?;
        check(RESTORE_TOOL, completion, self.config.ignore_exit_code)
    }
}
