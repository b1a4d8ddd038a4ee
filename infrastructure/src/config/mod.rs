//! Configuration file loading for browser-dap
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `BROWSER_DAP_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./browser-dap.toml` or `./.browser-dap.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/browser-dap/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileCdpConfig, FileConfig, FileLaunchConfig, FileLoggingConfig,
};
pub use loader::ConfigLoader;
