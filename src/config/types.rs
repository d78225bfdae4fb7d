use super::loader::Result;
use super::options::*;
use super::resolver::Resolver;
use std::fmt;
use std::path::PathBuf;

/// A resolved secret. Never printed by `Debug`.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("Secret(<empty>)")
        } else {
            f.write_str("Secret(***)")
        }
    }
}

/// MySQL service configuration
#[derive(Debug, Clone)]
pub struct MysqlConfig {
    pub host: String,
    pub port: String,
    pub user: String,
    pub password: Secret,
    pub database: String,
    /// Extra arguments passed to the dump tool
    pub options: Vec<String>,
    pub compress: bool,
    pub ignore_exit_code: bool,
    pub save_dir: PathBuf,
}

impl MysqlConfig {
    pub fn resolve(r: &Resolver) -> Result<Self> {
        Ok(Self {
            host: r.string(&DATABASE_HOST),
            port: r.string(&DATABASE_PORT),
            user: r.string(&DATABASE_USER),
            password: r.database_password()?,
            database: r.string(&DATABASE_NAME),
            options: split_options(&r.string(&DATABASE_OPTIONS)),
            compress: r.flag(&DATABASE_COMPRESS)?,
            ignore_exit_code: r.flag(&DATABASE_IGNORE_EXIT_CODE)?,
            save_dir: r.require_path(&SAVE_DIR)?,
        })
    }
}

/// Postgres service configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub host: String,
    pub port: String,
    pub user: String,
    pub password: Secret,
    pub database: String,
    pub options: Vec<String>,
    pub compress: bool,
    /// Custom (always compressed) dump format, only used with a database name
    pub custom: bool,
    pub ignore_exit_code: bool,
    pub save_dir: PathBuf,
}

impl PostgresConfig {
    pub fn resolve(r: &Resolver) -> Result<Self> {
        Ok(Self {
            host: r.string(&DATABASE_HOST),
            port: r.string(&DATABASE_PORT),
            user: r.string(&DATABASE_USER),
            password: r.database_password()?,
            database: r.string(&DATABASE_NAME),
            options: split_options(&r.string(&DATABASE_OPTIONS)),
            compress: r.flag(&DATABASE_COMPRESS)?,
            custom: r.flag(&POSTGRES_CUSTOM)?,
            ignore_exit_code: r.flag(&DATABASE_IGNORE_EXIT_CODE)?,
            save_dir: r.require_path(&SAVE_DIR)?,
        })
    }
}

/// Gogs service configuration
#[derive(Debug, Clone)]
pub struct GogsConfig {
    /// Path to app.ini; skipped when unset
    pub config_path: Option<PathBuf>,
    pub data_path: PathBuf,
    pub save_dir: PathBuf,
}

impl GogsConfig {
    pub fn resolve(r: &Resolver) -> Result<Self> {
        Ok(Self {
            config_path: r.path(&GOGS_CONFIG),
            data_path: r.require_path(&GOGS_DATA)?,
            save_dir: r.require_path(&SAVE_DIR)?,
        })
    }
}

/// Tarball service configuration
#[derive(Debug, Clone)]
pub struct TarballConfig {
    /// Directory archived on backup and unpacked into on restore
    pub path: PathBuf,
    /// Artifact name override; defaults to the last segment of `path`
    pub name: String,
    pub compress: bool,
    pub save_dir: PathBuf,
}

impl TarballConfig {
    pub fn resolve(r: &Resolver) -> Result<Self> {
        Ok(Self {
            path: r.require_path(&TARBALL_PATH)?,
            name: r.string(&TARBALL_NAME),
            compress: r.flag(&TARBALL_COMPRESS)?,
            save_dir: r.require_path(&SAVE_DIR)?,
        })
    }
}

/// S3-compatible object store configuration
#[derive(Debug, Clone)]
pub struct ObjectStoreConfig {
    /// Custom endpoint; empty means the AWS default
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: Secret,
    /// Path-style instead of virtual-host-style addressing
    pub force_path_style: bool,
    /// Prepended to every object key
    pub prefix: String,
    pub save_dir: PathBuf,
}

impl ObjectStoreConfig {
    pub fn resolve(r: &Resolver) -> Result<Self> {
        Ok(Self {
            endpoint: r.string(&S3_ENDPOINT),
            region: r.require(&S3_REGION)?,
            bucket: r.require(&S3_BUCKET)?,
            access_key: r.string(&S3_ACCESS_KEY),
            secret_key: r.secret(&S3_SECRET_KEY)?,
            force_path_style: r.flag(&S3_FORCE_PATH_STYLE)?,
            prefix: r.string(&S3_PREFIX),
            save_dir: r.require_path(&SAVE_DIR)?,
        })
    }
}

/// Local filesystem store configuration
#[derive(Debug, Clone)]
pub struct FilesystemConfig {
    pub path: PathBuf,
    pub save_dir: PathBuf,
}

impl FilesystemConfig {
    pub fn resolve(r: &Resolver) -> Result<Self> {
        Ok(Self {
            path: r.require_path(&FILESYSTEM_PATH)?,
            save_dir: r.require_path(&SAVE_DIR)?,
        })
    }
}

fn split_options(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::resolver::FlagValues;
    use crate::config::ConfigError;
    use std::collections::HashMap;

    fn flags(pairs: &[(&str, &str)]) -> Resolver {
        let flags: FlagValues = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Resolver::new(flags, HashMap::new(), Default::default())
    }

    #[test]
    fn test_secret_debug_is_redacted() {
        let secret = Secret::new("hunter2");
        assert_eq!(format!("{:?}", secret), "Secret(***)");
    }

    #[test]
    fn test_mysql_config() {
        let r = flags(&[
            ("database-host", "db"),
            ("database-port", "3306"),
            ("database-name", "shop"),
            ("database-options", "--single-transaction  --quick"),
            ("database-compress", "true"),
            ("savedir", "/backups"),
        ]);

        let config = MysqlConfig::resolve(&r).unwrap();
        assert_eq!(config.host, "db");
        assert_eq!(config.database, "shop");
        assert_eq!(config.options, vec!["--single-transaction", "--quick"]);
        assert!(config.compress);
        assert!(!config.ignore_exit_code);
        assert_eq!(config.save_dir, PathBuf::from("/backups"));
    }

    #[test]
    fn test_tarball_requires_path() {
        let r = flags(&[]);
        assert!(matches!(
            TarballConfig::resolve(&r),
            Err(ConfigError::MissingOption("tarball-path"))
        ));
    }

    #[test]
    fn test_gogs_defaults() {
        let config = GogsConfig::resolve(&flags(&[])).unwrap();
        assert_eq!(config.data_path, PathBuf::from("/data"));
        assert_eq!(config.save_dir, PathBuf::from("/tmp"));
        assert!(config.config_path.is_none());
    }

    #[test]
    fn test_object_store_requires_bucket() {
        assert!(matches!(
            ObjectStoreConfig::resolve(&flags(&[])),
            Err(ConfigError::MissingOption("s3-bucket"))
        ));

        let config = ObjectStoreConfig::resolve(&flags(&[
            ("s3-bucket", "backups"),
            ("s3-force-path-style", "yes"),
        ]))
        .unwrap();
        assert_eq!(config.region, "us-east-1");
        assert!(config.force_path_style);
    }
}
