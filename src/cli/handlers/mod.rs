//! Command handlers for CLI operations
//!
//! Separates command execution from parsing and validation.

pub mod migrate;
pub mod send;
pub mod serve;

pub use migrate::MigrateCommandHandler;
pub use send::SendCommandHandler;
pub use serve::ServeCommandHandler;
