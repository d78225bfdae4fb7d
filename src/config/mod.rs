//! Configuration resolution for s3-backup
//!
//! Every option is described once in [`options`] and resolved by the
//! [`Resolver`] through a fixed precedence chain (earlier wins):
//! 1. Explicit command-line flag
//! 2. Environment variable
//! 3. Config file (flat TOML table keyed by option name)
//! 4. Hard-coded default
//!
//! Secret-capable options additionally go through value-or-file
//! indirection: a value naming an existing file is replaced by the file's
//! trimmed contents.
//!
//! ## Example Usage
//!
//! ```no_run
//! use s3_backup::config::{FlagValues, Resolver, TarballConfig};
//!
//! let resolver = Resolver::from_process(FlagValues::new())?;
//! let tarball = TarballConfig::resolve(&resolver)?;
//! println!("Archiving {:?} into {:?}", tarball.path, tarball.save_dir);
//! # Ok::<(), s3_backup::config::ConfigError>(())
//! ```

mod loader;
pub mod options;
mod resolver;
mod types;

pub use loader::{load_file, parse_overlay, ConfigError, FileOverlay, Result};
pub use options::{OptionKind, OptionSpec};
pub use resolver::{parse_bool, resolve_secret, FlagValues, Resolver, Source};
pub use types::*;

/// Expand tilde (~) in path
pub fn expand_tilde(path: &std::path::Path) -> std::path::PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}
