//! Table of every recognized option
//!
//! The option name doubles as the long flag and the config file key.

/// How a resolved value is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Text,
    Path,
    Bool,
    Integer,
    /// Value-or-file indirection applies
    Secret,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionSpec {
    pub name: &'static str,
    pub env: &'static str,
    pub default: Option<&'static str>,
    pub kind: OptionKind,
}

const fn opt(
    name: &'static str,
    env: &'static str,
    default: Option<&'static str>,
    kind: OptionKind,
) -> OptionSpec {
    OptionSpec {
        name,
        env,
        default,
        kind,
    }
}

use OptionKind::*;

// Global
pub const CONFIG_FILE: OptionSpec = opt("config", "CONFIG_FILE", None, Path);
pub const SAVE_DIR: OptionSpec = opt("savedir", "SAVE_DIR", Some("/tmp"), Path);
pub const LOG_LEVEL: OptionSpec = opt("log-level", "LOG_LEVEL", Some("info"), Text);
pub const LOG_DIRECTORY: OptionSpec = opt("log-directory", "LOG_DIRECTORY", None, Path);
pub const LOG_MAX_FILES: OptionSpec = opt("log-max-files", "LOG_MAX_FILES", Some("10"), Integer);
pub const RESTORE_KEY: OptionSpec = opt("restore-key", "RESTORE_KEY", None, Text);

// Databases (MySQL and Postgres)
pub const DATABASE_HOST: OptionSpec = opt("database-host", "DATABASE_HOST", None, Text);
pub const DATABASE_PORT: OptionSpec = opt("database-port", "DATABASE_PORT", None, Text);
pub const DATABASE_NAME: OptionSpec = opt("database-name", "DATABASE_NAME", None, Text);
pub const DATABASE_USER: OptionSpec = opt("database-user", "DATABASE_USER", None, Text);
pub const DATABASE_PASSWORD: OptionSpec =
    opt("database-password", "DATABASE_PASSWORD", None, Secret);
pub const DATABASE_PASSWORD_FILE: OptionSpec =
    opt("database-password-file", "DATABASE_PASSWORD_FILE", None, Path);
pub const DATABASE_OPTIONS: OptionSpec = opt("database-options", "DATABASE_OPTIONS", None, Text);
pub const DATABASE_COMPRESS: OptionSpec =
    opt("database-compress", "DATABASE_COMPRESS", Some("false"), Bool);
pub const DATABASE_IGNORE_EXIT_CODE: OptionSpec = opt(
    "database-ignore-exit-code",
    "DATABASE_IGNORE_EXIT_CODE",
    Some("false"),
    Bool,
);
pub const POSTGRES_CUSTOM: OptionSpec =
    opt("postgres-custom", "POSTGRES_CUSTOM_FORMAT", Some("false"), Bool);

// Gogs
pub const GOGS_CONFIG: OptionSpec = opt("gogs-config", "GOGS_CONFIG", None, Path);
pub const GOGS_DATA: OptionSpec = opt("gogs-data", "GOGS_DATA", Some("/data"), Path);

// Tarball
pub const TARBALL_PATH: OptionSpec = opt("tarball-path", "TARBALL_PATH_SOURCE", None, Path);
pub const TARBALL_NAME: OptionSpec = opt("tarball-name", "TARBALL_NAME_PREFIX", None, Text);
pub const TARBALL_COMPRESS: OptionSpec =
    opt("tarball-compress", "TARBALL_COMPRESS", Some("false"), Bool);

// Object store
pub const S3_ENDPOINT: OptionSpec = opt("s3-endpoint", "S3_ENDPOINT", None, Text);
pub const S3_REGION: OptionSpec = opt("s3-region", "S3_REGION", Some("us-east-1"), Text);
pub const S3_BUCKET: OptionSpec = opt("s3-bucket", "S3_BUCKET", None, Text);
pub const S3_ACCESS_KEY: OptionSpec = opt("s3-access-key", "S3_ACCESS_KEY", None, Text);
pub const S3_SECRET_KEY: OptionSpec = opt("s3-secret-key", "S3_SECRET_KEY", None, Secret);
pub const S3_FORCE_PATH_STYLE: OptionSpec =
    opt("s3-force-path-style", "S3_FORCE_PATH_STYLE", Some("false"), Bool);
pub const S3_PREFIX: OptionSpec = opt("s3-prefix", "S3_PREFIX", None, Text);

// Filesystem store
pub const FILESYSTEM_PATH: OptionSpec = opt("filesystem-path", "FILESYSTEM_PATH", None, Path);

pub const ALL: &[OptionSpec] = &[
    CONFIG_FILE,
    SAVE_DIR,
    LOG_LEVEL,
    LOG_DIRECTORY,
    LOG_MAX_FILES,
    RESTORE_KEY,
    DATABASE_HOST,
    DATABASE_PORT,
    DATABASE_NAME,
    DATABASE_USER,
    DATABASE_PASSWORD,
    DATABASE_PASSWORD_FILE,
    DATABASE_OPTIONS,
    DATABASE_COMPRESS,
    DATABASE_IGNORE_EXIT_CODE,
    POSTGRES_CUSTOM,
    GOGS_CONFIG,
    GOGS_DATA,
    TARBALL_PATH,
    TARBALL_NAME,
    TARBALL_COMPRESS,
    S3_ENDPOINT,
    S3_REGION,
    S3_BUCKET,
    S3_ACCESS_KEY,
    S3_SECRET_KEY,
    S3_FORCE_PATH_STYLE,
    S3_PREFIX,
    FILESYSTEM_PATH,
];

/// Look up an option by its flag / file key
pub fn find(name: &str) -> Option<&'static OptionSpec> {
    ALL.iter().find(|spec| spec.name == name)
}
