//! Chrome DevTools Protocol adapter
//!
//! Implements `CdpTransport` over a WebSocket connection to a page target.

pub mod discovery;
pub mod error;
pub mod gateway;
pub mod protocol;
pub mod router;
pub mod transport;
