//! Page target discovery over the browser's HTTP endpoint (`/json/list`).

use crate::cdp::error::{CdpError, Result};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// Delay between discovery attempts while the browser is starting.
const RETRY_DELAY: Duration = Duration::from_millis(200);

/// One entry of `/json/list`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfo {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    /// Absent while another client holds the target.
    #[serde(default)]
    pub web_socket_debugger_url: Option<String>,
}

impl TargetInfo {
    fn is_page(&self) -> bool {
        self.kind == "page" && self.web_socket_debugger_url.is_some()
    }
}

fn same_url(a: &str, b: &str) -> bool {
    a.trim_end_matches('/') == b.trim_end_matches('/')
}

/// Pick the page to debug: the one showing `url` if given, else the first page.
pub fn select_target<'a>(targets: &'a [TargetInfo], url: Option<&str>) -> Option<&'a TargetInfo> {
    let pages = || targets.iter().filter(|t| t.is_page());
    url.and_then(|url| pages().find(|t| same_url(&t.url, url)))
        .or_else(|| pages().next())
}

/// Finds the WebSocket URL of a page target.
pub struct TargetDiscovery {
    client: reqwest::Client,
    host: String,
    retries: u32,
}

impl TargetDiscovery {
    pub fn new(host: impl Into<String>, connect_timeout: Duration, retries: u32) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(connect_timeout)
            .build()
            .map_err(|e| CdpError::Discovery(e.to_string()))?;
        Ok(Self {
            client,
            host: host.into(),
            retries,
        })
    }

    /// Resolve the debugger URL of the page on `port`, retrying while the
    /// browser is still coming up.
    pub async fn discover(&self, port: u16, url: Option<&str>) -> Result<String> {
        let endpoint = format!("http://{}:{}/json/list", self.host, port);
        let mut last_error = CdpError::NoTarget { port };

        for attempt in 0..=self.retries {
            if attempt > 0 {
                tokio::time::sleep(RETRY_DELAY).await;
            }
            match self.fetch(&endpoint).await {
                Ok(targets) => {
                    if let Some(target) = select_target(&targets, url)
                        && let Some(ws_url) = &target.web_socket_debugger_url
                    {
                        info!("Selected target {} ({})", target.id, target.url);
                        return Ok(ws_url.clone());
                    }
                    debug!("No page target yet on port {} (attempt {})", port, attempt + 1);
                    last_error = CdpError::NoTarget { port };
                }
                Err(e) => {
                    debug!("Discovery attempt {} failed: {}", attempt + 1, e);
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }

    async fn fetch(&self, endpoint: &str) -> Result<Vec<TargetInfo>> {
        let response = self
            .client
            .get(endpoint)
            .send()
            .await
            .map_err(|e| CdpError::Discovery(e.to_string()))?;
        response
            .json::<Vec<TargetInfo>>()
            .await
            .map_err(|e| CdpError::Discovery(e.to_string()))
    }
}
