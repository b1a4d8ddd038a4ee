//! Port for structured protocol tracing.
//!
//! Defines the [`ProtocolTraceLogger`] trait for recording every message the
//! adapter exchanges with the browser and with the IDE.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostic messages, while this port captures the raw
//! traffic in a machine-readable format (JSONL).

use serde_json::Value;

/// Which way a traced message travelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Adapter to peer.
    Outgoing,
    /// Peer to adapter.
    Incoming,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Outgoing => "out",
            Direction::Incoming => "in",
        }
    }
}

/// One traced protocol message.
pub struct TraceEvent {
    /// Protocol the message belongs to ("cdp" or "dap").
    pub channel: &'static str,
    pub direction: Direction,
    /// The message as sent or received.
    pub payload: Value,
}

impl TraceEvent {
    pub fn new(channel: &'static str, direction: Direction, payload: Value) -> Self {
        Self {
            channel,
            direction,
            payload,
        }
    }
}

/// Port for logging protocol traffic to a structured log.
///
/// Implementations write each event as a single record (e.g., one JSONL line).
/// The `log` method is synchronous and non-fallible so that tracing never
/// disrupts the protocol flow; write failures are ignored.
pub trait ProtocolTraceLogger: Send + Sync {
    fn log(&self, event: TraceEvent);
}

/// No-op implementation for tests and when tracing is disabled.
pub struct NoProtocolTrace;

impl ProtocolTraceLogger for NoProtocolTrace {
    fn log(&self, _event: TraceEvent) {}
}
