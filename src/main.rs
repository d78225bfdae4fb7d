use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use s3_backup::config::{options, FlagValues, OptionSpec, Resolver};
use s3_backup::managers::backup::{operations, Action, Operation};
use s3_backup::managers::logging::{init_logging, LoggingConfig};
use s3_backup::services::ServiceKind;
use s3_backup::stores::StoreKind;
use s3_backup::utils::RealExecutor;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "s3-backup")]
#[command(about = "Back up databases, Gogs and directories to S3 or a local directory", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory where local artifacts are written [default: /tmp]
    #[arg(long, global = true)]
    savedir: Option<PathBuf>,

    /// Console and file log level [default: info]
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Also write daily-rotated log files into this directory
    #[arg(long, global = true)]
    log_directory: Option<PathBuf>,

    /// Number of rotated log files to keep [default: 10]
    #[arg(long, global = true)]
    log_max_files: Option<u32>,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture an artifact and upload it to a store
    Backup {
        #[command(subcommand)]
        service: ServiceCommand,
    },

    /// Fetch an artifact from a store and restore it
    Restore {
        /// Artifact to restore (defaults to the newest one for the service)
        #[arg(long)]
        restore_key: Option<String>,

        #[command(subcommand)]
        service: ServiceCommand,
    },
}

#[derive(Subcommand)]
enum ServiceCommand {
    /// MySQL database via mysqldump / mysql
    Mysql {
        #[command(flatten)]
        database: DatabaseArgs,

        #[command(subcommand)]
        store: StoreCommand,
    },

    /// PostgreSQL database via pg_dump / psql / pg_restore
    Postgres {
        #[command(flatten)]
        database: DatabaseArgs,

        /// Use the pg_dump custom format (single database only)
        #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
        postgres_custom: Option<bool>,

        #[command(subcommand)]
        store: StoreCommand,
    },

    /// Gogs config file and data directory
    Gogs {
        /// Gogs app.ini
        #[arg(long)]
        gogs_config: Option<PathBuf>,

        /// Gogs data directory [default: /data]
        #[arg(long)]
        gogs_data: Option<PathBuf>,

        #[command(subcommand)]
        store: StoreCommand,
    },

    /// Any directory tree
    Tarball {
        /// Directory to archive or restore into
        #[arg(long)]
        tarball_path: Option<PathBuf>,

        /// Artifact name prefix (defaults to the directory name)
        #[arg(long)]
        tarball_name: Option<String>,

        /// Gzip the archive
        #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
        tarball_compress: Option<bool>,

        #[command(subcommand)]
        store: StoreCommand,
    },
}

#[derive(Args)]
struct DatabaseArgs {
    #[arg(long)]
    database_host: Option<String>,

    #[arg(long)]
    database_port: Option<String>,

    /// Database to dump (all databases when empty)
    #[arg(long)]
    database_name: Option<String>,

    #[arg(long)]
    database_user: Option<String>,

    /// Password, or a path to a file holding it
    #[arg(long)]
    database_password: Option<String>,

    /// File holding the password (wins over --database-password)
    #[arg(long)]
    database_password_file: Option<PathBuf>,

    /// Extra arguments passed to the dump tool, space separated
    #[arg(long, allow_hyphen_values = true)]
    database_options: Option<String>,

    /// Gzip the dump
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    database_compress: Option<bool>,

    /// Treat a non-zero exit of the restore tool as success
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    database_ignore_exit_code: Option<bool>,
}

#[derive(Subcommand)]
enum StoreCommand {
    /// S3-compatible object storage
    #[command(name = "object-store", alias = "s3")]
    ObjectStore {
        #[arg(long)]
        s3_endpoint: Option<String>,

        /// [default: us-east-1]
        #[arg(long)]
        s3_region: Option<String>,

        #[arg(long)]
        s3_bucket: Option<String>,

        #[arg(long)]
        s3_access_key: Option<String>,

        /// Secret key, or a path to a file holding it
        #[arg(long)]
        s3_secret_key: Option<String>,

        /// Use path-style addressing
        #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
        s3_force_path_style: Option<bool>,

        /// Prepended to every object key
        #[arg(long)]
        s3_prefix: Option<String>,
    },

    /// Local directory
    Filesystem {
        #[arg(long)]
        filesystem_path: Option<PathBuf>,
    },
}

/// Only flags given explicitly end up in the map
fn set<T: ToString>(flags: &mut FlagValues, spec: &OptionSpec, value: &Option<T>) {
    if let Some(value) = value {
        flags.insert(spec.name.to_string(), value.to_string());
    }
}

fn set_path(flags: &mut FlagValues, spec: &OptionSpec, value: &Option<PathBuf>) {
    if let Some(value) = value {
        flags.insert(spec.name.to_string(), value.display().to_string());
    }
}

impl GlobalArgs {
    fn collect(&self, flags: &mut FlagValues) {
        set_path(flags, &options::CONFIG_FILE, &self.config);
        set_path(flags, &options::SAVE_DIR, &self.savedir);
        set(flags, &options::LOG_LEVEL, &self.log_level);
        set_path(flags, &options::LOG_DIRECTORY, &self.log_directory);
        set(flags, &options::LOG_MAX_FILES, &self.log_max_files);
    }
}

impl DatabaseArgs {
    fn collect(&self, flags: &mut FlagValues) {
        set(flags, &options::DATABASE_HOST, &self.database_host);
        set(flags, &options::DATABASE_PORT, &self.database_port);
        set(flags, &options::DATABASE_NAME, &self.database_name);
        set(flags, &options::DATABASE_USER, &self.database_user);
        set(flags, &options::DATABASE_PASSWORD, &self.database_password);
        set_path(flags, &options::DATABASE_PASSWORD_FILE, &self.database_password_file);
        set(flags, &options::DATABASE_OPTIONS, &self.database_options);
        set(flags, &options::DATABASE_COMPRESS, &self.database_compress);
        set(flags, &options::DATABASE_IGNORE_EXIT_CODE, &self.database_ignore_exit_code);
    }
}

impl ServiceCommand {
    fn collect(&self, flags: &mut FlagValues) -> (ServiceKind, StoreKind) {
        let (kind, store) = match self {
            ServiceCommand::Mysql { database, store } => {
                database.collect(flags);
                (ServiceKind::Mysql, store)
            }
            ServiceCommand::Postgres {
                database,
                postgres_custom,
                store,
            } => {
                database.collect(flags);
                set(flags, &options::POSTGRES_CUSTOM, postgres_custom);
                (ServiceKind::Postgres, store)
            }
            ServiceCommand::Gogs {
                gogs_config,
                gogs_data,
                store,
            } => {
                set_path(flags, &options::GOGS_CONFIG, gogs_config);
                set_path(flags, &options::GOGS_DATA, gogs_data);
                (ServiceKind::Gogs, store)
            }
            ServiceCommand::Tarball {
                tarball_path,
                tarball_name,
                tarball_compress,
                store,
            } => {
                set_path(flags, &options::TARBALL_PATH, tarball_path);
                set(flags, &options::TARBALL_NAME, tarball_name);
                set(flags, &options::TARBALL_COMPRESS, tarball_compress);
                (ServiceKind::Tarball, store)
            }
        };

        (kind, store.collect(flags))
    }
}

impl StoreCommand {
    fn collect(&self, flags: &mut FlagValues) -> StoreKind {
        match self {
            StoreCommand::ObjectStore {
                s3_endpoint,
                s3_region,
                s3_bucket,
                s3_access_key,
                s3_secret_key,
                s3_force_path_style,
                s3_prefix,
            } => {
                set(flags, &options::S3_ENDPOINT, s3_endpoint);
                set(flags, &options::S3_REGION, s3_region);
                set(flags, &options::S3_BUCKET, s3_bucket);
                set(flags, &options::S3_ACCESS_KEY, s3_access_key);
                set(flags, &options::S3_SECRET_KEY, s3_secret_key);
                set(flags, &options::S3_FORCE_PATH_STYLE, s3_force_path_style);
                set(flags, &options::S3_PREFIX, s3_prefix);
                StoreKind::ObjectStore
            }
            StoreCommand::Filesystem { filesystem_path } => {
                set_path(flags, &options::FILESYSTEM_PATH, filesystem_path);
                StoreKind::Filesystem
            }
        }
    }
}

impl Cli {
    /// Operation to run plus the flags given explicitly
    fn into_operation(self) -> (Operation, FlagValues) {
        let mut flags = FlagValues::new();
        self.global.collect(&mut flags);

        let (action, service) = match self.command {
            Commands::Backup { service } => (Action::Backup, service),
            Commands::Restore {
                restore_key,
                service,
            } => {
                set(&mut flags, &options::RESTORE_KEY, &restore_key);
                (Action::Restore, service)
            }
        };

        let (service, store) = service.collect(&mut flags);
        (Operation::new(action, service, store), flags)
    }
}

fn run(cli: Cli) -> Result<()> {
    let (operation, flags) = cli.into_operation();
    if !operations().contains(&operation) {
        bail!("{} is not a supported operation", operation);
    }

    let resolver = Resolver::from_process(flags).context("Failed to load configuration")?;

    // Keep the guard alive until the operation has finished
    let logging_config = LoggingConfig::from_resolver(&resolver)?;
    let _log_guard = init_logging(&logging_config)?;

    operation
        .run(&resolver, Arc::new(RealExecutor::new()))
        .with_context(|| format!("{} failed", operation))?;

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
