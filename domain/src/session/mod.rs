//! Debug session lifecycle.

pub mod phase;
