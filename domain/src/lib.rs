//! Domain layer for browser-dap
//!
//! This crate contains the core state of the debug adapter: the breakpoint
//! store, the closed sets of protocol events on both sides of the bridge,
//! and the session lifecycle. It has no dependencies on I/O.
//!
//! # Core Concepts
//!
//! ## Breakpoint Store
//!
//! For every source URL the store keeps the list of positions the IDE last
//! asked for and the breakpoints the browser actually accepted. An epoch
//! counter advances every time the browser clears its execution contexts
//! (navigation or reload); breakpoints committed in an older epoch are stale.
//!
//! ## Events
//!
//! - [`CdpEvent`]: everything the browser pushes at us
//! - [`IdeEvent`]: everything we push at the IDE

pub mod breakpoint;
pub mod core;
pub mod event;
pub mod session;

// Re-export commonly used types
pub use breakpoint::{
    entities::{CommittedBreakpoint, Resolution, SourceEntry},
    store::{BreakpointStore, ReconcilePlan},
    value_objects::{BreakpointId, BreakpointStatus, Epoch, Position, ResolvedLocation, ScriptId},
};
pub use core::error::DomainError;
pub use event::{
    cdp_event::{CdpEvent, ConsoleMessage},
    ide_event::{IdeEvent, OutputCategory, OutputEvent},
};
pub use session::phase::SessionPhase;
