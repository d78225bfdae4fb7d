//! Artifact naming
//!
//! Artifacts are named `<logical-name>-backup-<yyyyMMddHHmmss>[.ext]`. The
//! timestamp is fixed-width, so names of one logical source sort in
//! creation order.

use chrono::NaiveDateTime;
use std::path::Path;

pub const MARKER: &str = "-backup-";
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";
const TIMESTAMP_LEN: usize = 14;

pub const GZIP_SUFFIX: &str = ".gz";

/// Build an artifact file name
pub fn artifact_name(logical: &str, timestamp: NaiveDateTime, extension: &str) -> String {
    format!(
        "{}{}{}{}",
        logical,
        MARKER,
        timestamp.format(TIMESTAMP_FORMAT),
        extension
    )
}

/// Build an extension from a format suffix and the compression flag
pub fn extension(format: &str, compress: bool) -> String {
    if compress {
        format!("{}{}", format, GZIP_SUFFIX)
    } else {
        format.to_string()
    }
}

/// Whether the artifact is gzip compressed, judged by its name
pub fn is_gzip(path: &Path) -> bool {
    path.to_string_lossy().ends_with(GZIP_SUFFIX)
}

/// Key prefix shared by every artifact of one logical source
pub fn prefix_for(logical: &str) -> String {
    format!("{}{}", logical, MARKER)
}

/// The parts of an artifact file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactName {
    pub logical: String,
    pub timestamp: NaiveDateTime,
    pub extension: String,
}

impl ArtifactName {
    /// Parse a file name (or a path / object key ending in one)
    pub fn parse(name: &str) -> Option<Self> {
        let file_name = name.rsplit('/').next().unwrap_or(name);
        let marker = file_name.rfind(MARKER)?;
        let logical = &file_name[..marker];
        let rest = &file_name[marker + MARKER.len()..];

        if logical.is_empty() || rest.len() < TIMESTAMP_LEN || !rest.is_char_boundary(TIMESTAMP_LEN) {
            return None;
        }

        let (stamp, extension) = rest.split_at(TIMESTAMP_LEN);
        if !stamp.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let timestamp = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()?;

        Some(Self {
            logical: logical.to_string(),
            timestamp,
            extension: extension.to_string(),
        })
    }

    pub fn is_gzip(&self) -> bool {
        self.extension.ends_with(GZIP_SUFFIX)
    }
}

/// Pick the newest artifact of `logical` among `names`
pub fn newest<'a, I>(logical: &str, names: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    names
        .into_iter()
        .filter_map(|name| ArtifactName::parse(name).map(|parsed| (parsed, name)))
        .filter(|(parsed, _)| parsed.logical == logical)
        .max_by(|(a, a_name), (b, b_name)| a.timestamp.cmp(&b.timestamp).then(a_name.cmp(b_name)))
        .map(|(_, name)| name)
}
