//! Artifact destinations

pub mod filesystem;
pub mod object_store;

pub use filesystem::FilesystemStore;
pub use object_store::ObjectStore;

use crate::config::{FilesystemConfig, ObjectStoreConfig, Resolver};
use crate::error::Result;
use std::fmt;
use std::path::{Path, PathBuf};

/// Trait for artifact stores
pub trait Store {
    /// Get store name (for logging)
    fn name(&self) -> &'static str;

    /// Transfer a local artifact into the store, keyed by its file name
    fn upload(&self, artifact: &Path) -> Result<()>;

    /// Bring the artifact stored under `key` into the save directory
    fn fetch(&self, key: &str) -> Result<PathBuf>;

    /// Key of the newest artifact for a logical name, if any
    fn latest(&self, logical: &str) -> Result<Option<String>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKind {
    ObjectStore,
    Filesystem,
}

impl StoreKind {
    pub const ALL: [StoreKind; 2] = [StoreKind::ObjectStore, StoreKind::Filesystem];

    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKind::ObjectStore => "object-store",
            StoreKind::Filesystem => "filesystem",
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve the configuration for `kind` and construct the store
pub fn build(kind: StoreKind, resolver: &Resolver) -> Result<Box<dyn Store>> {
    Ok(match kind {
        StoreKind::ObjectStore => Box::new(ObjectStore::new(ObjectStoreConfig::resolve(resolver)?)?),
        StoreKind::Filesystem => Box::new(FilesystemStore::new(FilesystemConfig::resolve(resolver)?)),
    })
}

/// File name component of an artifact path, used as its key
pub(crate) fn file_name(artifact: &Path) -> Option<String> {
    artifact
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
}
