//! s3-backup library
//!
//! Backs up databases, Gogs instances and directory trees into timestamped
//! artifacts and moves them to S3-compatible object storage or a local
//! directory.

pub mod artifact;
pub mod config;
pub mod error;
pub mod managers;
pub mod services;
pub mod stores;
pub mod utils;

// Re-export commonly used types
pub use config::{FlagValues, Resolver};
pub use error::{Error, Result};
pub use managers::backup::{operations, Action, Operation};
pub use managers::logging::{init_logging, LogGuard, LoggingConfig};
pub use services::{Service, ServiceKind};
pub use stores::{Store, StoreKind};
