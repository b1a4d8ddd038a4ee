//! Presentation layer for browser-dap
//!
//! This crate contains the command-line definition and the IDE-facing
//! Debug Adapter Protocol server.

pub mod cli;
pub mod dap;

// Re-export commonly used types
pub use cli::commands::Cli;
pub use dap::io::{FramingError, read_message, write_message};
pub use dap::server::DapServer;
