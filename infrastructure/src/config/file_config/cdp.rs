//! Browser connection configuration from TOML (`[cdp]` section)

use serde::{Deserialize, Serialize};

/// Raw CDP connection configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCdpConfig {
    /// Host of the browser's debugging endpoint
    pub host: String,
    /// Upper bound for a single CDP command round trip
    pub request_timeout_ms: u64,
    /// Upper bound for each discovery request and the WebSocket handshake
    pub connect_timeout_ms: u64,
    /// Extra discovery attempts while the browser is starting
    pub connect_retries: u32,
}

impl Default for FileCdpConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            request_timeout_ms: 10_000,
            connect_timeout_ms: 5_000,
            connect_retries: 10,
        }
    }
}

impl FileCdpConfig {
    pub fn to_settings(&self) -> crate::cdp::gateway::CdpSettings {
        crate::cdp::gateway::CdpSettings {
            host: self.host.clone(),
            request_timeout: std::time::Duration::from_millis(self.request_timeout_ms),
            connect_timeout: std::time::Duration::from_millis(self.connect_timeout_ms),
            connect_retries: self.connect_retries,
        }
    }
}
