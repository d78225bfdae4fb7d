pub mod archive;
pub mod command;

// Trait-based abstraction for testability
pub mod executor;

pub use executor::{CommandExecutor, RealExecutor};
