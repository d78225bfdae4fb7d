//! Tests for backup operations
//!
//! A backup captures one artifact and hands exactly that file to the store.

use s3_backup::error::Error;
use s3_backup::managers::backup::{run_backup, Action, Operation};
use s3_backup::services::ServiceKind;
use s3_backup::stores::StoreKind;
use std::fs;
use std::sync::Arc;
use test_utils::{
    sample_site, sample_sql_dump, MockExecutor, MockResponse, MockService, MockStore,
    ResultAssertions, TestContext,
};

#[test]
fn test_backup_uploads_produced_artifact() {
    let ctx = TestContext::new();
    let service = MockService::new("site", ctx.save_dir());
    let store = MockStore::new(ctx.path("fetched"));

    let artifact = run_backup(&service, &store).assert_ok();

    let key = artifact.file_name().unwrap().to_string_lossy().into_owned();
    assert!(key.starts_with("site-backup-"));
    assert_eq!(store.keys(), vec![key.clone()]);
    assert_eq!(store.get(&key).unwrap(), service.payload().as_bytes());
}

#[test]
fn test_failed_capture_uploads_nothing() {
    let ctx = TestContext::new();
    let service = MockService::failing("site", ctx.save_dir());
    let store = MockStore::new(ctx.path("fetched"));

    run_backup(&service, &store).assert_err_contains("connection refused");
    assert!(store.keys().is_empty());
}

#[test]
fn test_failed_upload_keeps_local_artifact() {
    let ctx = TestContext::new();
    let service = MockService::new("site", ctx.save_dir());
    let store = MockStore::failing(ctx.path("fetched"));

    let result = run_backup(&service, &store);
    assert!(matches!(result, Err(Error::StoreTransfer { .. })));

    let local: Vec<_> = fs::read_dir(ctx.save_dir()).unwrap().collect();
    assert_eq!(local.len(), 1);
}

#[test]
fn test_mysql_backup_to_filesystem() {
    let ctx = TestContext::new()
        .with("database-name", "shop")
        .with("database-compress", "true")
        .with_path("filesystem-path", "store");
    let executor = MockExecutor::new().expect("mysqldump", MockResponse::output(sample_sql_dump()));

    let op = Operation::new(Action::Backup, ServiceKind::Mysql, StoreKind::Filesystem);
    let artifact = op.run(&ctx.resolver(), Arc::new(executor.clone())).assert_ok();

    let name = artifact.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("shop-backup-"));
    assert!(name.ends_with(".sql.gz"));
    assert!(ctx.path("store").join(&name).exists());
    assert_eq!(executor.call_count("mysqldump"), 1);
}

#[test]
fn test_tarball_backup_to_filesystem() {
    let ctx = TestContext::new();
    let site = sample_site(&ctx.path("data"), "site");
    let ctx = ctx
        .with("tarball-path", site.display().to_string())
        .with("tarball-compress", "true")
        .with_path("filesystem-path", "store");

    let op = Operation::new(Action::Backup, ServiceKind::Tarball, StoreKind::Filesystem);
    let artifact = op.run(&ctx.resolver(), Arc::new(MockExecutor::new())).assert_ok();

    assert!(artifact.starts_with(ctx.save_dir()));
    let stored = ctx
        .path("store")
        .join(artifact.file_name().unwrap());
    assert_eq!(fs::read(&stored).unwrap(), fs::read(&artifact).unwrap());
}

#[test]
fn test_dump_failure_aborts_before_upload() {
    let ctx = TestContext::new()
        .with("database-name", "shop")
        .with_path("filesystem-path", "store");
    let executor = MockExecutor::new().expect("pg_dump", MockResponse::exit(1, "role \"root\" does not exist"));

    let op = Operation::new(Action::Backup, ServiceKind::Postgres, StoreKind::Filesystem);
    op.run(&ctx.resolver(), Arc::new(executor))
        .assert_err_contains("does not exist");

    assert!(!ctx.path("store").exists());
}

#[test]
fn test_missing_store_option_fails_before_capture() {
    let ctx = TestContext::new().with("database-name", "shop");
    let executor = MockExecutor::new();

    let op = Operation::new(Action::Backup, ServiceKind::Mysql, StoreKind::Filesystem);
    op.run(&ctx.resolver(), Arc::new(executor.clone()))
        .assert_err_contains("filesystem-path");

    assert!(executor.get_calls().is_empty());
}
