//! Browser launch configuration from TOML (`[launch]` section)

use serde::{Deserialize, Serialize};

/// Raw launch configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLaunchConfig {
    /// Browser executable; searched on `PATH` when unset
    pub browser_path: Option<String>,
    /// Remote debugging port used when a launch request names none
    pub default_port: u16,
    pub headless: bool,
    /// Arguments added to every launch, before the request's own
    pub extra_args: Vec<String>,
}

impl Default for FileLaunchConfig {
    fn default() -> Self {
        Self {
            browser_path: None,
            default_port: 9222,
            headless: false,
            extra_args: Vec::new(),
        }
    }
}

impl FileLaunchConfig {
    pub fn to_settings(&self) -> crate::browser::LaunchSettings {
        crate::browser::LaunchSettings {
            browser_path: self.browser_path.clone(),
            default_port: self.default_port,
            headless: self.headless,
            extra_args: self.extra_args.clone(),
        }
    }
}
