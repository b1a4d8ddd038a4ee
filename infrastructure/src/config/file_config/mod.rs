//! Raw TOML configuration data types
//!
//! These structs mirror the config file layout one-to-one and are merged by
//! [`ConfigLoader`](super::ConfigLoader).

mod cdp;
mod launch;
mod logging;

pub use cdp::FileCdpConfig;
pub use launch::FileLaunchConfig;
pub use logging::FileLoggingConfig;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("cdp.{0} cannot be 0")]
    ZeroTimeout(&'static str),

    #[error("launch.default_port cannot be 0")]
    ZeroPort,
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Browser connection settings
    pub cdp: FileCdpConfig,
    /// Browser launch settings
    pub launch: FileLaunchConfig,
    /// Log destinations
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.cdp.request_timeout_ms == 0 {
            return Err(ConfigValidationError::ZeroTimeout("request_timeout_ms"));
        }
        if self.cdp.connect_timeout_ms == 0 {
            return Err(ConfigValidationError::ZeroTimeout("connect_timeout_ms"));
        }
        if self.launch.default_port == 0 {
            return Err(ConfigValidationError::ZeroPort);
        }
        Ok(())
    }
}
