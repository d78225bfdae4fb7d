//! Tests for restore operations
//!
//! A restore fetches one artifact, explicit or newest, and feeds it to the
//! service.

use s3_backup::error::Error;
use s3_backup::managers::backup::{run_restore, Action, Operation};
use s3_backup::services::ServiceKind;
use s3_backup::stores::StoreKind;
use std::fs;
use std::sync::Arc;
use test_utils::{
    sample_site, sample_sql_dump, MockExecutor, MockResponse, MockService, MockStore,
    ResultAssertions, TestContext,
};

#[test]
fn test_restore_newest_when_no_key() {
    let ctx = TestContext::new();
    let service = MockService::new("site", ctx.save_dir());
    let store = MockStore::new(ctx.save_dir());
    store.insert("site-backup-20180601100000.txt", b"june");
    store.insert("site-backup-20180801100000.txt", b"august");
    store.insert("site-backup-20180701100000.txt", b"july");
    store.insert("other-backup-20190101100000.txt", b"other");

    let local = run_restore(&service, &store, None).assert_ok();

    assert_eq!(local, ctx.save_dir().join("site-backup-20180801100000.txt"));
    assert_eq!(service.restored(), vec![(local, "august".to_string())]);
}

#[test]
fn test_restore_explicit_key() {
    let ctx = TestContext::new();
    let service = MockService::new("site", ctx.save_dir());
    let store = MockStore::new(ctx.save_dir());
    store.insert("site-backup-20180601100000.txt", b"june");
    store.insert("site-backup-20180801100000.txt", b"august");

    run_restore(&service, &store, Some("site-backup-20180601100000.txt")).assert_ok();
    assert_eq!(service.restored()[0].1, "june");
}

#[test]
fn test_restore_unknown_key() {
    let ctx = TestContext::new();
    let service = MockService::new("site", ctx.save_dir());
    let store = MockStore::new(ctx.save_dir());

    let result = run_restore(&service, &store, Some("site-backup-20180601100000.txt"));
    assert!(matches!(result, Err(Error::StoreTransfer { .. })));
    assert!(service.restored().is_empty());
}

#[test]
fn test_restore_nothing_stored() {
    let ctx = TestContext::new();
    let service = MockService::new("site", ctx.save_dir());
    let store = MockStore::new(ctx.save_dir());

    run_restore(&service, &store, None).assert_err_contains("no artifact found");
}

#[test]
fn test_mysql_restore_from_filesystem_with_key() {
    let ctx = TestContext::new()
        .with("database-name", "shop")
        .with_path("filesystem-path", "store")
        .with("restore-key", "shop-backup-20180601100000.sql");
    ctx.create_file("store/shop-backup-20180601100000.sql", sample_sql_dump());
    let executor = MockExecutor::new().expect("mysql", MockResponse::output(""));

    let op = Operation::new(Action::Restore, ServiceKind::Mysql, StoreKind::Filesystem);
    let local = op.run(&ctx.resolver(), Arc::new(executor.clone())).assert_ok();

    assert_eq!(local, ctx.save_dir().join("shop-backup-20180601100000.sql"));
    let call = executor.last_call().unwrap();
    assert_eq!(call.program(), "mysql");
    assert!(call.has_arg("shop"));
    assert_eq!(call.stdin_data, sample_sql_dump().as_bytes());
}

#[test]
fn test_postgres_custom_restore_uses_pg_restore() {
    let ctx = TestContext::new()
        .with("database-name", "shop")
        .with_path("filesystem-path", "store");
    ctx.create_file("store/shop-backup-20180601100000.dump", "PGDMP");
    let executor = MockExecutor::new();

    let op = Operation::new(Action::Restore, ServiceKind::Postgres, StoreKind::Filesystem);
    op.run(&ctx.resolver(), Arc::new(executor.clone())).assert_ok();

    let call = executor.last_call().unwrap();
    assert_eq!(call.program(), "pg_restore");
    assert_eq!(call.stdin_data, b"PGDMP");
}

#[test]
fn test_masked_restore_failure() {
    let ctx = TestContext::new()
        .with_path("filesystem-path", "store")
        .with("database-ignore-exit-code", "true");
    ctx.create_file("store/all-databases-backup-20180601100000.sql", sample_sql_dump());
    let executor = MockExecutor::new().expect("psql", MockResponse::exit(3, "ERROR: relation exists"));

    let op = Operation::new(Action::Restore, ServiceKind::Postgres, StoreKind::Filesystem);
    op.run(&ctx.resolver(), Arc::new(executor)).assert_ok();
}

#[test]
fn test_tarball_round_trip_through_filesystem() {
    let ctx = TestContext::new();
    let site = sample_site(&ctx.path("data"), "site");
    let backup = TestContext::new()
        .with("tarball-path", site.display().to_string())
        .with("filesystem-path", ctx.path("store").display().to_string());

    Operation::new(Action::Backup, ServiceKind::Tarball, StoreKind::Filesystem)
        .run(&backup.resolver(), Arc::new(MockExecutor::new()))
        .assert_ok();

    let restore = TestContext::new()
        .with("tarball-path", ctx.path("restored/site").display().to_string())
        .with("filesystem-path", ctx.path("store").display().to_string());
    Operation::new(Action::Restore, ServiceKind::Tarball, StoreKind::Filesystem)
        .run(&restore.resolver(), Arc::new(MockExecutor::new()))
        .assert_ok();

    assert_eq!(
        fs::read_to_string(ctx.path("restored/site/css/main.css")).unwrap(),
        "body { margin: 0 }\n"
    );
    assert!(ctx.path("restored/site/img/.keep").exists());
}
