//! Domain error types

use crate::session::phase::SessionPhase;
use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid session transition: {from} -> {to}")]
    InvalidTransition { from: SessionPhase, to: SessionPhase },

    #[error("Invalid breakpoint position: {0}")]
    InvalidPosition(String),
}

impl DomainError {
    /// Check if this error is a rejected lifecycle transition
    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, DomainError::InvalidTransition { .. })
    }
}
