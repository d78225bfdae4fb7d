//! Unit tests for s3-backup
//!
//! Configuration resolution, artifact naming and service construction,
//! without touching external tools or networks.

mod artifact;
mod config;
mod services;
