//! Unit tests for configuration resolution
//!
//! These tests build resolvers from explicit layers, so they never depend on
//! the process environment.

use rstest::rstest;
use s3_backup::config::{
    parse_bool, parse_overlay, ConfigError, FilesystemConfig, GogsConfig, MysqlConfig,
    ObjectStoreConfig, PostgresConfig, TarballConfig,
};
use std::path::{Path, PathBuf};
use test_utils::{ResultAssertions, TestContext};

#[rstest]
#[case(Some("flag"), Some("env"), Some("file"), "flag")]
#[case(None, Some("env"), Some("file"), "env")]
#[case(None, None, Some("file"), "file")]
#[case(None, None, None, "us-east-1")]
#[case(None, Some(""), Some("file"), "file")]
fn test_region_precedence(
    #[case] flag: Option<&str>,
    #[case] env: Option<&str>,
    #[case] file: Option<&str>,
    #[case] expected: &str,
) {
    let mut ctx = TestContext::new().with("s3-bucket", "backups");
    if let Some(v) = flag {
        ctx = ctx.with("s3-region", v);
    }
    if let Some(v) = env {
        ctx = ctx.with_env("S3_REGION", v);
    }
    if let Some(v) = file {
        ctx = ctx.with_file_value("s3-region", v);
    }

    let config = ObjectStoreConfig::resolve(&ctx.resolver()).assert_ok();
    assert_eq!(config.region, expected);
}

#[rstest]
#[case("true", true)]
#[case("YES", true)]
#[case("1", true)]
#[case("off", false)]
#[case("", false)]
fn test_parse_bool(#[case] raw: &str, #[case] expected: bool) {
    assert_eq!(parse_bool("tarball-compress", raw).unwrap(), expected);
}

#[test]
fn test_parse_bool_rejects_garbage() {
    parse_bool("tarball-compress", "maybe").assert_err_contains("tarball-compress");
}

#[test]
fn test_invalid_bool_from_env() {
    let ctx = TestContext::new()
        .with_path("tarball-path", "site")
        .with_env("TARBALL_COMPRESS", "sometimes");

    let result = TarballConfig::resolve(&ctx.resolver());
    assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
}

#[rstest]
#[case("tarball-path")]
#[case("filesystem-path")]
#[case("s3-bucket")]
fn test_missing_required_option(#[case] option: &str) {
    let resolver = TestContext::new().resolver();
    let err = match option {
        "tarball-path" => TarballConfig::resolve(&resolver).err(),
        "filesystem-path" => FilesystemConfig::resolve(&resolver).err(),
        _ => ObjectStoreConfig::resolve(&resolver).err(),
    };

    match err {
        Some(ConfigError::MissingOption(name)) => assert_eq!(name, option),
        other => panic!("Expected MissingOption({}), got {:?}", option, other),
    }
}

#[test]
fn test_database_records_share_options() {
    let ctx = TestContext::new()
        .with("database-name", "shop")
        .with("database-options", "--single-transaction  --quick")
        .with("postgres-custom", "true");
    let resolver = ctx.resolver();

    let mysql = MysqlConfig::resolve(&resolver).assert_ok();
    let postgres = PostgresConfig::resolve(&resolver).assert_ok();

    assert_eq!(mysql.options, vec!["--single-transaction", "--quick"]);
    assert_eq!(mysql.options, postgres.options);
    assert!(postgres.custom);
    assert_eq!(mysql.save_dir, ctx.save_dir());
}

#[test]
fn test_password_file_wins_over_password() {
    let ctx = TestContext::new();
    let secret = ctx.create_file("secrets/db", "  from-file\n");
    let ctx = ctx
        .with("database-password", "literal")
        .with("database-password-file", secret.display().to_string());

    let config = PostgresConfig::resolve(&ctx.resolver()).assert_ok();
    assert_eq!(config.password.expose(), "from-file");
}

#[test]
fn test_secret_key_literal_when_not_a_file() {
    let ctx = TestContext::new()
        .with("s3-bucket", "backups")
        .with("s3-secret-key", "not/a/real/path");

    let config = ObjectStoreConfig::resolve(&ctx.resolver()).assert_ok();
    assert_eq!(config.secret_key.expose(), "not/a/real/path");
}

#[test]
fn test_gogs_defaults() {
    let config = GogsConfig::resolve(&TestContext::new().resolver()).assert_ok();
    assert_eq!(config.data_path, PathBuf::from("/data"));
    assert!(config.config_path.is_none());
}

#[test]
fn test_overlay_from_toml() {
    let overlay = parse_overlay(
        Path::new("s3-backup.toml"),
        r#"
database-options = ["--single-transaction", "--quick"]
database-compress = true
log-max-files = 3
"#,
    )
    .assert_ok();

    assert_eq!(overlay["database-options"], "--single-transaction --quick");
    assert_eq!(overlay["database-compress"], "true");
    assert_eq!(overlay["log-max-files"], "3");
}

#[test]
fn test_overlay_rejects_tables() {
    parse_overlay(Path::new("s3-backup.toml"), "[s3]\nbucket = \"x\"\n").assert_err_contains("s3");
}
