//! [`CdpTransport`] implementation over a live browser connection.

use crate::cdp::discovery::TargetDiscovery;
use crate::cdp::error::CdpError;
use crate::cdp::protocol::{RemoveBreakpointParams, SetBreakpointByUrlParams, SetBreakpointByUrlResult};
use crate::cdp::router::CdpRouter;
use async_trait::async_trait;
use browser_dap_application::{
    AttachTarget, CdpTransport, EventReceiver, NoProtocolTrace, ProtocolTraceLogger,
    SetBreakpointResult, TransportError,
};
use browser_dap_domain::{BreakpointId, Position};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Domains enabled on every new connection.
const ENABLE_DOMAINS: [&str; 3] = ["Runtime.enable", "Debugger.enable", "Console.enable"];

/// Connection settings, usually taken from the `[cdp]` config section.
#[derive(Debug, Clone)]
pub struct CdpSettings {
    pub host: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub connect_retries: u32,
}

impl Default for CdpSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            request_timeout: Duration::from_millis(10_000),
            connect_timeout: Duration::from_millis(5_000),
            connect_retries: 10,
        }
    }
}

/// Browser debugging connection for one session.
pub struct CdpGateway {
    settings: CdpSettings,
    trace: Arc<dyn ProtocolTraceLogger>,
    router: RwLock<Option<Arc<CdpRouter>>>,
}

impl CdpGateway {
    pub fn new(settings: CdpSettings) -> Self {
        Self::with_trace(settings, Arc::new(NoProtocolTrace))
    }

    pub fn with_trace(settings: CdpSettings, trace: Arc<dyn ProtocolTraceLogger>) -> Self {
        Self {
            settings,
            trace,
            router: RwLock::new(None),
        }
    }

    async fn router(&self) -> Result<Arc<CdpRouter>, TransportError> {
        self.router
            .read()
            .await
            .clone()
            .ok_or_else(|| TransportError::ConnectionLost("not connected".into()))
    }

    async fn connect(&self, target: &AttachTarget) -> Result<(Arc<CdpRouter>, EventReceiver), CdpError> {
        let discovery = TargetDiscovery::new(
            self.settings.host.clone(),
            self.settings.connect_timeout,
            self.settings.connect_retries,
        )?;
        let ws_url = discovery.discover(target.port, target.url.as_deref()).await?;

        let (router, events) = CdpRouter::connect(
            &ws_url,
            self.settings.connect_timeout,
            self.settings.request_timeout,
            Arc::clone(&self.trace),
        )
        .await?;

        for method in ENABLE_DOMAINS {
            if let Err(e) = router.call(method, None).await {
                router.close().await;
                return Err(e);
            }
        }
        Ok((router, events))
    }
}

#[async_trait]
impl CdpTransport for CdpGateway {
    async fn attach(&self, target: &AttachTarget) -> Result<EventReceiver, TransportError> {
        if let Some(previous) = self.router.write().await.take() {
            previous.close().await;
        }

        let (router, events) = self.connect(target).await.map_err(|e| {
            warn!("CDP attach failed: {}", e);
            TransportError::Connect(e.to_string())
        })?;
        *self.router.write().await = Some(router);
        info!("CDP session ready on port {}", target.port);
        Ok(events)
    }

    async fn set_breakpoint_by_url(
        &self,
        url: &str,
        position: Position,
    ) -> Result<SetBreakpointResult, TransportError> {
        let router = self.router().await?;
        let params = serde_json::to_value(SetBreakpointByUrlParams::new(url, position))
            .map_err(CdpError::from)?;
        let result = router
            .call("Debugger.setBreakpointByUrl", Some(params))
            .await?;

        let parsed: SetBreakpointByUrlResult =
            serde_json::from_value(result).map_err(|e| CdpError::UnexpectedResponse {
                method: "Debugger.setBreakpointByUrl".into(),
                detail: e.to_string(),
            })?;
        debug!(
            "Breakpoint {} set at {}:{} ({} locations)",
            parsed.breakpoint_id,
            url,
            position,
            parsed.locations.len()
        );

        Ok(SetBreakpointResult {
            breakpoint_id: BreakpointId::new(parsed.breakpoint_id),
            locations: parsed.locations.into_iter().map(Into::into).collect(),
        })
    }

    async fn remove_breakpoint(&self, id: &BreakpointId) -> Result<(), TransportError> {
        let router = self.router().await?;
        let params = serde_json::to_value(RemoveBreakpointParams {
            breakpoint_id: id.as_str().to_string(),
        })
        .map_err(CdpError::from)?;
        router
            .call("Debugger.removeBreakpoint", Some(params))
            .await?;
        Ok(())
    }

    async fn detach(&self) {
        if let Some(router) = self.router.write().await.take() {
            router.close().await;
            info!("CDP connection closed");
        }
    }
}
