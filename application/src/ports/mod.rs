//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod browser_launcher;
pub mod cdp_transport;
pub mod path_resolver;
pub mod trace_logger;
