//! Backup sources
//!
//! Every service turns its data into one artifact file in the save directory
//! and can restore from such a file.

pub mod gogs;
pub mod mysql;
pub mod postgres;
pub mod tarball;

pub use gogs::GogsService;
pub use mysql::MysqlService;
pub use postgres::PostgresService;
pub use tarball::TarballService;

use crate::config::{GogsConfig, MysqlConfig, PostgresConfig, Resolver, TarballConfig};
use crate::error::Result;
use crate::utils::CommandExecutor;
use chrono::{Local, NaiveDateTime};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Logical name used by the database services when dumping every database
pub const ALL_DATABASES: &str = "all-databases";

/// Trait for backup sources
pub trait Service {
    /// Get service name (for logging)
    fn name(&self) -> &'static str;

    /// Logical name that prefixes every artifact of this service
    fn artifact_prefix(&self) -> String;

    /// Produce an artifact stamped with `timestamp`
    fn backup_at(&self, timestamp: NaiveDateTime) -> Result<PathBuf>;

    /// Produce an artifact stamped with the current local time
    fn backup(&self) -> Result<PathBuf> {
        self.backup_at(Local::now().naive_local())
    }

    /// Restore from a local artifact
    fn restore(&self, artifact: &Path) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    Mysql,
    Postgres,
    Gogs,
    Tarball,
}

impl ServiceKind {
    pub const ALL: [ServiceKind; 4] = [
        ServiceKind::Mysql,
        ServiceKind::Postgres,
        ServiceKind::Gogs,
        ServiceKind::Tarball,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::Mysql => "mysql",
            ServiceKind::Postgres => "postgres",
            ServiceKind::Gogs => "gogs",
            ServiceKind::Tarball => "tarball",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve the configuration for `kind` and construct the service
pub fn build(
    kind: ServiceKind,
    resolver: &Resolver,
    executor: Arc<dyn CommandExecutor>,
) -> Result<Box<dyn Service>> {
    Ok(match kind {
        ServiceKind::Mysql => Box::new(MysqlService::new(MysqlConfig::resolve(resolver)?, executor)),
        ServiceKind::Postgres => Box::new(PostgresService::new(
            PostgresConfig::resolve(resolver)?,
            executor,
        )),
        ServiceKind::Gogs => Box::new(GogsService::new(GogsConfig::resolve(resolver)?)),
        ServiceKind::Tarball => Box::new(TarballService::new(TarballConfig::resolve(resolver)?)),
    })
}

/// Connection arguments shared by the database tools
pub(crate) fn push_flag(args: &mut Vec<String>, flag: &str, value: &str) {
    if !value.is_empty() {
        args.push(flag.to_string());
        args.push(value.to_string());
    }
}

/// Fail early when the save directory cannot be created
pub(crate) fn ensure_save_dir(save_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(save_dir).map_err(|e| crate::error::Error::archive(save_dir, e))
}
