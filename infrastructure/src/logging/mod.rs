//! Logging infrastructure - structured protocol tracing.
//!
//! Provides [`JsonlTraceLogger`], a JSONL file writer that implements the
//! [`ProtocolTraceLogger`](browser_dap_application::ProtocolTraceLogger) port.

mod jsonl_logger;

pub use jsonl_logger::JsonlTraceLogger;
