//! Infrastructure layer for browser-dap
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer: the CDP WebSocket transport, the Chrome launcher, path
//! resolution, configuration file loading and the JSONL protocol trace.

pub mod browser;
pub mod cdp;
pub mod config;
pub mod logging;
pub mod paths;

// Re-export commonly used types
pub use browser::{ChromeLauncher, LaunchSettings};
pub use cdp::{
    error::{CdpError, Result},
    gateway::{CdpGateway, CdpSettings},
    router::CdpRouter,
};
pub use config::{
    ConfigLoader, ConfigValidationError, FileCdpConfig, FileConfig, FileLaunchConfig,
    FileLoggingConfig,
};
pub use logging::JsonlTraceLogger;
pub use paths::FileUrlPathResolver;
