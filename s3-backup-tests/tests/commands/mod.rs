//! Command tests for s3-backup
//!
//! These tests run whole backup and restore operations with mocked tools
//! and stores.

mod backup;
mod operations;
mod restore;
