//! Test fixtures and sample data

use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::{Path, PathBuf};

/// 2018-06-01 10:00:00, the stamp used throughout the suite
pub fn sample_timestamp() -> NaiveDateTime {
    timestamp(2018, 6, 1)
}

pub fn timestamp(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(10, 0, 0))
        .expect("valid fixture date")
}

/// Artifact names for two logical names, deliberately unsorted
pub fn sample_artifact_names() -> Vec<&'static str> {
    vec![
        "site-backup-20180601100000.tar.gz",
        "blog-backup-20190101100000.tar",
        "site-backup-20180801100000.tar.gz",
        "site-backup-20180701100000.tar",
        "site.tar.gz",
    ]
}

/// Write a small website tree under `root/name` and return its path
pub fn sample_site(root: &Path, name: &str) -> PathBuf {
    let site = root.join(name);
    let files = [
        ("index.html", "<h1>hello</h1>\n"),
        ("css/main.css", "body { margin: 0 }\n"),
        ("img/.keep", ""),
    ];
    for (file, content) in files {
        let path = site.join(file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create fixture directory");
        }
        fs::write(&path, content).expect("Failed to write fixture file");
    }
    site
}

/// Minimal Gogs app.ini
pub fn gogs_app_ini() -> &'static str {
    r#"APP_NAME = Gogs
RUN_USER = git

[server]
DOMAIN = git.example.com
HTTP_PORT = 3000

[database]
DB_TYPE = sqlite3
PATH = /data/gogs.db
"#
}

/// Write a Gogs config file and data directory under `root`
pub fn sample_gogs(root: &Path) -> (PathBuf, PathBuf) {
    let config = root.join("gogs/conf/app.ini");
    let data = root.join("gogs/data");
    fs::create_dir_all(config.parent().expect("config has a parent"))
        .expect("Failed to create Gogs conf dir");
    fs::write(&config, gogs_app_ini()).expect("Failed to write app.ini");
    fs::create_dir_all(data.join("repositories/alice/dotfiles.git"))
        .expect("Failed to create Gogs data dir");
    fs::write(
        data.join("repositories/alice/dotfiles.git/HEAD"),
        "ref: refs/heads/master\n",
    )
    .expect("Failed to write HEAD");
    fs::write(data.join("gogs.db"), "SQLite format 3").expect("Failed to write gogs.db");
    (config, data)
}

/// Plain-text SQL dump as a dump tool would print it
pub fn sample_sql_dump() -> &'static str {
    "-- dump\nCREATE TABLE posts (id INT PRIMARY KEY, title TEXT);\nINSERT INTO posts VALUES (1, 'hello');\n"
}
