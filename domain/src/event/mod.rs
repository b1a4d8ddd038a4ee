//! Protocol events on both sides of the bridge.
//!
//! Both sets are closed enums so that every consumer matches exhaustively.

pub mod cdp_event;
pub mod ide_event;
