//! CDP transport port
//!
//! Defines the interface to the browser's remote debugging connection.
//! The transport correlates commands with their responses and delivers
//! unsolicited events, in arrival order, on a single channel per session.

use async_trait::async_trait;
use browser_dap_domain::{BreakpointId, CdpEvent, Position, ResolvedLocation};
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors that can occur during transport operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    #[error("{method} failed: {message}")]
    Call { method: String, message: String },

    #[error("Timeout waiting for {0}")]
    Timeout(String),

    #[error("Connection error: {0}")]
    Connect(String),
}

impl TransportError {
    /// Session-level failure: every pending and future call fails too.
    pub fn is_connection_lost(&self) -> bool {
        matches!(self, TransportError::ConnectionLost(_))
    }
}

/// Where to attach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachTarget {
    /// Remote debugging port of the browser.
    pub port: u16,
    /// Page URL to prefer when the browser has several targets.
    pub url: Option<String>,
}

impl AttachTarget {
    pub fn new(port: u16) -> Self {
        Self { port, url: None }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// Result of a breakpoint-by-url call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetBreakpointResult {
    pub breakpoint_id: BreakpointId,
    /// Immediate resolutions, if the script is already loaded.
    pub locations: Vec<ResolvedLocation>,
}

/// The session's single ordered event stream.
pub type EventReceiver = mpsc::UnboundedReceiver<CdpEvent>;

/// Connection to a browser's debugging endpoint
///
/// Implementations live in the infrastructure layer. Every call is a round
/// trip; implementations must fail pending calls with
/// [`TransportError::ConnectionLost`] when the connection drops rather than
/// leaving them waiting.
#[async_trait]
pub trait CdpTransport: Send + Sync {
    /// Connect and return the event stream for this connection.
    async fn attach(&self, target: &AttachTarget) -> Result<EventReceiver, TransportError>;

    /// Register a breakpoint for every script loaded from `url`.
    async fn set_breakpoint_by_url(
        &self,
        url: &str,
        position: Position,
    ) -> Result<SetBreakpointResult, TransportError>;

    async fn remove_breakpoint(&self, id: &BreakpointId) -> Result<(), TransportError>;

    /// Close the connection. Idempotent.
    async fn detach(&self);
}
