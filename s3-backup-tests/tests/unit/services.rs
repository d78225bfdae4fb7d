//! Tests for services built from resolved configuration
//!
//! External tools are replaced by the mock executor; the archive-based
//! services run for real inside the temp dir.

use rstest::rstest;
use s3_backup::error::Error;
use s3_backup::services::{self, ServiceKind};
use std::fs;
use std::sync::Arc;
use test_utils::{
    sample_gogs, sample_site, sample_sql_dump, sample_timestamp, MockExecutor, MockResponse,
    TestContext,
};

#[rstest]
#[case(ServiceKind::Mysql, "", "all-databases-backup-20180601100000.sql", "mysqldump")]
#[case(ServiceKind::Mysql, "shop", "shop-backup-20180601100000.sql", "mysqldump")]
#[case(ServiceKind::Postgres, "", "all-databases-backup-20180601100000.sql", "pg_dumpall")]
#[case(ServiceKind::Postgres, "shop", "shop-backup-20180601100000.sql", "pg_dump")]
fn test_database_dump_tool_and_name(
    #[case] kind: ServiceKind,
    #[case] database: &str,
    #[case] expected_name: &str,
    #[case] expected_tool: &str,
) {
    let ctx = TestContext::new().with("database-name", database);
    let executor = MockExecutor::new().with_default_response(MockResponse::output(sample_sql_dump()));

    let service = services::build(kind, &ctx.resolver(), Arc::new(executor.clone())).unwrap();
    let artifact = service.backup_at(sample_timestamp()).unwrap();

    assert_eq!(artifact, ctx.save_dir().join(expected_name));
    assert_eq!(fs::read_to_string(&artifact).unwrap(), sample_sql_dump());
    let call = executor.last_call().unwrap();
    assert_eq!(call.program(), expected_tool);
}

#[test]
fn test_password_goes_to_environment() {
    let ctx = TestContext::new()
        .with("database-user", "backup")
        .with("database-password", "hunter2");
    let executor = MockExecutor::new();

    services::build(ServiceKind::Mysql, &ctx.resolver(), Arc::new(executor.clone()))
        .unwrap()
        .backup_at(sample_timestamp())
        .unwrap();

    let call = executor.last_call().unwrap();
    assert_eq!(call.env("MYSQL_PWD"), Some("hunter2"));
    assert!(!call.args().iter().any(|a| a.contains("hunter2")));
}

#[test]
fn test_compressed_dump_restores_plain_sql() {
    let ctx = TestContext::new()
        .with("database-name", "shop")
        .with("database-compress", "true");
    let executor = MockExecutor::new()
        .expect("pg_dump", MockResponse::output(sample_sql_dump()))
        .expect("psql", MockResponse::output(""));
    let service =
        services::build(ServiceKind::Postgres, &ctx.resolver(), Arc::new(executor.clone())).unwrap();

    let artifact = service.backup_at(sample_timestamp()).unwrap();
    assert!(artifact.to_string_lossy().ends_with(".sql.gz"));

    service.restore(&artifact).unwrap();
    let restore = executor.last_call().unwrap();
    assert_eq!(restore.program(), "psql");
    assert_eq!(restore.stdin_data, sample_sql_dump().as_bytes());
}

#[rstest]
#[case(false, true)]
#[case(true, false)]
fn test_restore_exit_code_tolerance(#[case] ignore: bool, #[case] expect_error: bool) {
    let ctx = TestContext::new().with("database-ignore-exit-code", ignore.to_string());
    let dump = ctx.create_file("save/all-databases-backup-20180601100000.sql", sample_sql_dump());
    let executor = MockExecutor::new().expect("mysql", MockResponse::exit(1, "ERROR 1062: Duplicate entry"));

    let result = services::build(ServiceKind::Mysql, &ctx.resolver(), Arc::new(executor))
        .unwrap()
        .restore(&dump);

    assert_eq!(result.is_err(), expect_error);
    if let Err(e) = result {
        assert!(matches!(e, Error::ExternalTool { .. }));
        assert!(e.to_string().contains("Duplicate entry"));
    }
}

#[test]
fn test_tarball_uses_directory_name() {
    let ctx = TestContext::new();
    let site = sample_site(&ctx.path("data"), "site");
    let ctx = ctx.with("tarball-path", site.display().to_string());

    let service = services::build(ServiceKind::Tarball, &ctx.resolver(), Arc::new(MockExecutor::new())).unwrap();
    assert_eq!(service.artifact_prefix(), "site");

    let artifact = service.backup_at(sample_timestamp()).unwrap();
    assert_eq!(artifact, ctx.save_dir().join("site-backup-20180601100000.tar"));
}

#[test]
fn test_gogs_round_trip_from_resolved_config() {
    let ctx = TestContext::new();
    let (config, data) = sample_gogs(ctx.temp_dir());
    let source = TestContext::new()
        .with("gogs-config", config.display().to_string())
        .with("gogs-data", data.display().to_string());

    let service = services::build(ServiceKind::Gogs, &source.resolver(), Arc::new(MockExecutor::new())).unwrap();
    let artifact = service.backup_at(sample_timestamp()).unwrap();
    assert!(artifact.ends_with("gogs-backup-20180601100000.tar.gz"));

    let target = TestContext::new()
        .with_path("gogs-config", "conf/app.ini")
        .with_path("gogs-data", "data");
    services::build(ServiceKind::Gogs, &target.resolver(), Arc::new(MockExecutor::new()))
        .unwrap()
        .restore(&artifact)
        .unwrap();

    assert_eq!(
        target.read_file("conf/app.ini").unwrap(),
        fs::read_to_string(&config).unwrap()
    );
    assert_eq!(
        target.read_file("data/repositories/alice/dotfiles.git/HEAD").unwrap(),
        "ref: refs/heads/master\n"
    );
}
