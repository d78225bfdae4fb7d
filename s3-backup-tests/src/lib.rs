//! Test utilities for s3-backup
//!
//! Shared context, fixtures and in-memory doubles for the service and store
//! traits.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use test_utils::{MockStore, TestContext};
//!
//! #[test]
//! fn my_test() {
//!     let ctx = TestContext::new().with("tarball-path", "/srv/site");
//!     let store = MockStore::new(ctx.save_dir());
//!     // ... test code
//! }
//! ```

pub mod fixtures;
pub mod mocks;
pub mod test_context;

// Re-export commonly used items
pub use fixtures::*;
pub use mocks::{MockService, MockStore};
pub use test_context::{ResultAssertions, TestContext};

// Re-export types from the main crate for convenience
pub use s3_backup::config::{FlagValues, Resolver};
pub use s3_backup::services::{Service, ServiceKind};
pub use s3_backup::stores::{Store, StoreKind};
pub use s3_backup::utils::executor::mock::{CommandCall, MockExecutor, MockResponse};
pub use s3_backup::utils::executor::CommandExecutor;
