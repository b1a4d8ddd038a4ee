//! Debug Adapter Protocol front end
//!
//! - [`io`]: Content-Length message framing
//! - [`protocol`]: request, response and event types
//! - [`server`]: request dispatch and event forwarding

pub mod io;
pub mod protocol;
pub mod server;
