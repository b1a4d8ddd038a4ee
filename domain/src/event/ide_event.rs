//! Events sent to the IDE.

use serde::{Deserialize, Serialize};

/// DAP output categories the adapter produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputCategory {
    Console,
    Stdout,
    Stderr,
}

impl OutputCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputCategory::Console => "console",
            OutputCategory::Stdout => "stdout",
            OutputCategory::Stderr => "stderr",
        }
    }
}

/// Body of an `output` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputEvent {
    pub category: OutputCategory,
    /// Copied verbatim from the source message.
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
}

impl OutputEvent {
    pub fn new(category: OutputCategory, text: impl Into<String>) -> Self {
        Self {
            category,
            text: text.into(),
            url: None,
            line: None,
            column: None,
        }
    }
}

/// Everything the adapter pushes to the IDE unprompted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdeEvent {
    /// Sent exactly once per successful attach.
    Initialized,
    Output(OutputEvent),
    /// The debuggee connection ended.
    Terminated,
}

impl IdeEvent {
    /// DAP event name.
    pub fn name(&self) -> &'static str {
        match self {
            IdeEvent::Initialized => "initialized",
            IdeEvent::Output(_) => "output",
            IdeEvent::Terminated => "terminated",
        }
    }
}
