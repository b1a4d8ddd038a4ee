//! Chrome/Chromium launcher.
//!
//! Starts the browser with remote debugging enabled on the requested port
//! and keeps the child process so it can be stopped on disconnect. On Linux
//! the child also receives `SIGTERM` if the adapter dies without cleaning up.

use crate::paths::FileUrlPathResolver;
use async_trait::async_trait;
use browser_dap_application::{
    BrowserLauncher, LaunchError, LaunchRequest, LaunchedBrowser, PathResolver,
};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Executables tried, in order, when no browser path is configured.
const BROWSER_CANDIDATES: [&str; 5] = [
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
    "chrome",
];

/// Launch defaults, usually taken from the `[launch]` config section.
#[derive(Debug, Clone)]
pub struct LaunchSettings {
    pub browser_path: Option<String>,
    pub default_port: u16,
    pub headless: bool,
    pub extra_args: Vec<String>,
}

impl Default for LaunchSettings {
    fn default() -> Self {
        Self {
            browser_path: None,
            default_port: 9222,
            headless: false,
            extra_args: Vec::new(),
        }
    }
}

/// Starts and stops a local Chrome-family browser.
pub struct ChromeLauncher {
    settings: LaunchSettings,
    paths: FileUrlPathResolver,
    child: Mutex<Option<Child>>,
}

impl ChromeLauncher {
    pub fn new(settings: LaunchSettings) -> Self {
        Self {
            settings,
            paths: FileUrlPathResolver::new(),
            child: Mutex::new(None),
        }
    }

    /// Find the browser executable: explicit path first, then `PATH`.
    fn resolve_executable(&self, requested: Option<&str>) -> Result<PathBuf, LaunchError> {
        if let Some(path) = requested.or(self.settings.browser_path.as_deref()) {
            let candidate = PathBuf::from(path);
            if candidate.is_file() {
                return Ok(candidate);
            }
            return which::which(path).map_err(|_| LaunchError::BrowserNotFound);
        }

        BROWSER_CANDIDATES
            .iter()
            .find_map(|name| which::which(name).ok())
            .ok_or(LaunchError::BrowserNotFound)
    }

    /// The URL the browser should open.
    fn target_url(&self, request: &LaunchRequest) -> Result<String, LaunchError> {
        match (&request.file, &request.url) {
            (Some(_), Some(_)) => Err(LaunchError::InvalidArguments(
                "`file` and `url` are mutually exclusive".into(),
            )),
            (Some(file), None) => Ok(self.paths.to_url(file)),
            (None, Some(url)) => Ok(url.clone()),
            (None, None) => Ok("about:blank".into()),
        }
    }

    /// Command line for a browser debugging on `port` and opening `url`.
    pub fn build_args(&self, port: u16, url: &str, runtime_args: &[String]) -> Vec<String> {
        let profile = std::env::temp_dir().join(format!("browser-dap-{}", port));
        let mut args = vec![
            format!("--remote-debugging-port={}", port),
            format!("--user-data-dir={}", profile.display()),
            "--no-first-run".to_string(),
            "--no-default-browser-check".to_string(),
        ];
        if self.settings.headless {
            args.push("--headless=new".to_string());
        }
        args.extend(self.settings.extra_args.iter().cloned());
        args.extend(runtime_args.iter().cloned());
        args.push(url.to_string());
        args
    }
}

#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    async fn launch(&self, request: &LaunchRequest) -> Result<LaunchedBrowser, LaunchError> {
        let url = self.target_url(request)?;
        let port = request.port.unwrap_or(self.settings.default_port);
        let executable = self.resolve_executable(request.browser_path.as_deref())?;
        let args = self.build_args(port, &url, &request.runtime_args);
        debug!("Launching {} {:?}", executable.display(), args);

        let mut cmd = Command::new(&executable);
        // stdout carries the DAP stream when serving over stdio
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        #[cfg(target_os = "linux")]
        unsafe {
            cmd.pre_exec(|| {
                libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM);
                Ok(())
            });
        }

        let child = cmd
            .spawn()
            .map_err(|e| LaunchError::Spawn(format!("{}: {}", executable.display(), e)))?;
        let pid = child.id();
        info!("Started {} (pid {:?}) on port {}", executable.display(), pid, port);

        let previous = self.child.lock().await.replace(child);
        if let Some(mut previous) = previous {
            warn!("Replacing a browser started earlier in this session");
            let _ = previous.kill().await;
        }

        Ok(LaunchedBrowser {
            port,
            url: Some(url),
            pid,
        })
    }

    async fn terminate(&self) {
        let child = self.child.lock().await.take();
        if let Some(mut child) = child {
            let pid = child.id();
            match child.kill().await {
                Ok(()) => info!("Browser (pid {:?}) stopped", pid),
                Err(e) => warn!("Failed to stop browser: {}", e),
            }
        }
    }
}
