//! Browser launcher port
//!
//! Starting the browser process is not part of the core; `launch` only
//! needs to know which debugging port the new browser listens on.

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while starting a browser
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("No browser executable found")]
    BrowserNotFound,

    #[error("Invalid launch arguments: {0}")]
    InvalidArguments(String),

    #[error("Failed to start browser: {0}")]
    Spawn(String),

    #[error("Launching is not supported")]
    Unsupported,
}

/// What to launch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchRequest {
    /// Local file to open (turned into a `file://` URL).
    pub file: Option<String>,
    /// URL to open.
    pub url: Option<String>,
    /// Extra browser arguments from the IDE.
    pub runtime_args: Vec<String>,
    /// Remote debugging port; the launcher's default when absent.
    pub port: Option<u16>,
    /// Explicit browser executable.
    pub browser_path: Option<String>,
}

/// A running browser ready to be attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchedBrowser {
    pub port: u16,
    /// URL the browser was asked to open.
    pub url: Option<String>,
    pub pid: Option<u32>,
}

/// Starts and stops browser processes
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self, request: &LaunchRequest) -> Result<LaunchedBrowser, LaunchError>;

    /// Stop the browser started by the last `launch`, if any.
    async fn terminate(&self);
}

/// Launcher for attach-only deployments.
pub struct NoLauncher;

#[async_trait]
impl BrowserLauncher for NoLauncher {
    async fn launch(&self, _request: &LaunchRequest) -> Result<LaunchedBrowser, LaunchError> {
        Err(LaunchError::Unsupported)
    }

    async fn terminate(&self) {}
}
