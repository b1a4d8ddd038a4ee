//! Use cases (application services)

pub mod path_locks;
pub mod reconcile_breakpoints;
pub mod session_controller;
pub mod translate_event;

#[cfg(test)]
pub(crate) mod test_support;
