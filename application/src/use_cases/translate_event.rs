//! Event translation use case
//!
//! Maps browser events onto store mutations and IDE-facing events. The only
//! state consulted is the store's epoch; everything else is a pure mapping.

use browser_dap_domain::{
    BreakpointStore, CdpEvent, ConsoleMessage, IdeEvent, OutputCategory, OutputEvent,
};
use tracing::{debug, trace};

/// What the session has to do after an event was applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Translation {
    /// Events to forward to the IDE.
    pub ide_events: Vec<IdeEvent>,
    /// Source URL whose breakpoints must be re-added for the new epoch.
    pub resync: Option<String>,
    /// Set when the browser connection is gone.
    pub connection_lost: Option<String>,
}

impl Translation {
    fn none() -> Self {
        Self::default()
    }

    fn forward(event: IdeEvent) -> Self {
        Self {
            ide_events: vec![event],
            ..Default::default()
        }
    }
}

/// Stateless dispatcher over [`CdpEvent`].
pub struct EventTranslator;

impl EventTranslator {
    /// Apply one event to the store and report the follow-up work.
    pub fn translate(store: &mut BreakpointStore, event: CdpEvent) -> Translation {
        trace!("Translating {} event", event.kind());
        match event {
            CdpEvent::ContextCleared => {
                let epoch = store.advance_epoch();
                debug!("Execution contexts cleared, epoch now {}", epoch);
                Translation::none()
            }
            CdpEvent::ScriptParsed { script_id, url } => {
                if store.record_script(&url, script_id) {
                    debug!("Script for {} re-parsed, scheduling resync", url);
                    Translation {
                        resync: Some(url),
                        ..Default::default()
                    }
                } else {
                    Translation::none()
                }
            }
            CdpEvent::BreakpointResolved {
                breakpoint_id,
                location,
            } => {
                if !store.resolve(&breakpoint_id, location.script_id) {
                    trace!("Ignoring resolution for untracked breakpoint {}", breakpoint_id);
                }
                Translation::none()
            }
            CdpEvent::ConsoleMessage(message) => {
                Translation::forward(IdeEvent::Output(Self::output(message)))
            }
            // The session decides whether this ends it and emits `terminated`
            CdpEvent::ConnectionLost { reason } => Translation {
                connection_lost: Some(reason),
                ..Default::default()
            },
        }
    }

    fn output(message: ConsoleMessage) -> OutputEvent {
        let category = if message.is_error() {
            OutputCategory::Stderr
        } else {
            OutputCategory::Stdout
        };
        OutputEvent {
            category,
            text: message.text,
            url: message.url,
            line: message.line,
            column: message.column,
        }
    }
}
