//! Events pushed by the browser.

use crate::breakpoint::value_objects::{BreakpointId, ResolvedLocation, ScriptId};
use serde::{Deserialize, Serialize};

/// A console message as reported by the browser.
///
/// Only `text` is required; the rest is display metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleMessage {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
}

impl ConsoleMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    /// Error and assert levels go to the IDE's error stream.
    pub fn is_error(&self) -> bool {
        matches!(self.level.as_deref(), Some("error") | Some("assert"))
    }
}

/// Every event the core reacts to, in the order the transport delivered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CdpEvent {
    /// All execution contexts were destroyed (navigation or reload).
    ContextCleared,
    /// A script was parsed.
    ScriptParsed { script_id: ScriptId, url: String },
    /// A breakpoint registered earlier was bound to a script.
    BreakpointResolved {
        breakpoint_id: BreakpointId,
        location: ResolvedLocation,
    },
    /// The page logged something.
    ConsoleMessage(ConsoleMessage),
    /// The connection to the browser is gone.
    ConnectionLost { reason: String },
}

impl CdpEvent {
    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            CdpEvent::ContextCleared => "context-cleared",
            CdpEvent::ScriptParsed { .. } => "script-parsed",
            CdpEvent::BreakpointResolved { .. } => "breakpoint-resolved",
            CdpEvent::ConsoleMessage(_) => "console-message-added",
            CdpEvent::ConnectionLost { .. } => "connection-lost",
        }
    }
}
