//! Application layer for browser-dap
//!
//! This crate contains the breakpoint reconciler, the event translator, the
//! session controller and the port definitions they drive.
//! It depends only on the domain layer.

pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use ports::{
    browser_launcher::{BrowserLauncher, LaunchError, LaunchRequest, LaunchedBrowser, NoLauncher},
    cdp_transport::{AttachTarget, CdpTransport, EventReceiver, SetBreakpointResult, TransportError},
    path_resolver::{IdentityPathResolver, PathResolver},
    trace_logger::{Direction, NoProtocolTrace, ProtocolTraceLogger, TraceEvent},
};
pub use use_cases::path_locks::PathLocks;
pub use use_cases::reconcile_breakpoints::{
    BreakpointReconciler, ReconcileError, ReconcileOutcome, ReconcileReport,
};
pub use use_cases::session_controller::{SessionController, SessionError};
pub use use_cases::translate_event::{EventTranslator, Translation};
