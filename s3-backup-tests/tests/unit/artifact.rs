//! Tests for artifact naming and selection

use rstest::rstest;
use s3_backup::artifact::{self, ArtifactName};
use test_utils::{sample_artifact_names, sample_timestamp, timestamp};

#[rstest]
#[case("site", ".tar.gz", "site-backup-20180601100000.tar.gz")]
#[case("shop", ".sql", "shop-backup-20180601100000.sql")]
#[case("all-databases", ".dump", "all-databases-backup-20180601100000.dump")]
#[case("gogs", "", "gogs-backup-20180601100000")]
fn test_artifact_name(#[case] logical: &str, #[case] ext: &str, #[case] expected: &str) {
    assert_eq!(artifact::artifact_name(logical, sample_timestamp(), ext), expected);
}

#[rstest]
#[case("my-site-backup-20180601100000.tar.gz", "my-site", ".tar.gz")]
#[case("nightly/db-backup-20180601100000.sql", "db", ".sql")]
#[case("site-backup-20180601100000", "site", "")]
fn test_parse(#[case] name: &str, #[case] logical: &str, #[case] ext: &str) {
    let parsed = ArtifactName::parse(name).unwrap();
    assert_eq!(parsed.logical, logical);
    assert_eq!(parsed.timestamp, sample_timestamp());
    assert_eq!(parsed.extension, ext);
}

#[rstest]
#[case("site.tar.gz")]
#[case("site-backup-2018.tar")]
#[case("site-backup-20181301100000.tar")]
#[case("-backup-20180601100000.tar")]
fn test_parse_rejects(#[case] name: &str) {
    assert!(ArtifactName::parse(name).is_none());
}

#[test]
fn test_names_sort_in_creation_order() {
    let older = artifact::artifact_name("site", timestamp(2018, 6, 1), ".tar");
    let newer = artifact::artifact_name("site", timestamp(2018, 12, 1), ".tar");
    assert!(older < newer);
}

#[rstest]
#[case("site", Some("site-backup-20180801100000.tar.gz"))]
#[case("blog", Some("blog-backup-20190101100000.tar"))]
#[case("shop", None)]
fn test_newest(#[case] logical: &str, #[case] expected: Option<&str>) {
    assert_eq!(artifact::newest(logical, sample_artifact_names()), expected);
}
