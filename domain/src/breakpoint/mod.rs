//! Breakpoint domain - desired and committed breakpoints per source.
//!
//! - [`value_objects`]: identifiers, positions, per-entry response status
//! - [`entities`]: committed breakpoints and per-source registry entries
//! - [`store`]: the [`BreakpointStore`](store::BreakpointStore) with epoch tracking

pub mod entities;
pub mod store;
pub mod value_objects;
