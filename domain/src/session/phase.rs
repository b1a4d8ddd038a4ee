//! Session lifecycle state machine.
//!
//! ```text
//! Idle ──> Attaching ──> Attached ──> Detached
//!   ^          └──────> Failed           │
//!   └── (re-attach from Failed/Detached) ┘
//! ```

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Where a debug session is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    #[default]
    Idle,
    Attaching,
    Attached,
    Detached,
    Failed,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Attaching => "attaching",
            SessionPhase::Attached => "attached",
            SessionPhase::Detached => "detached",
            SessionPhase::Failed => "failed",
        }
    }

    /// Breakpoint operations are only valid here.
    pub fn is_attached(&self) -> bool {
        matches!(self, SessionPhase::Attached)
    }

    /// An attach may start from this phase.
    pub fn accepts_attach(&self) -> bool {
        matches!(
            self,
            SessionPhase::Idle | SessionPhase::Failed | SessionPhase::Detached
        )
    }

    pub fn can_transition_to(&self, next: SessionPhase) -> bool {
        use SessionPhase::*;
        match (self, next) {
            (Idle | Failed | Detached, Attaching) => true,
            (Attaching, Attached | Failed) => true,
            (Attached, Detached) => true,
            // Detach during attach, or a second detach, is harmless
            (Attaching | Detached, Detached) => true,
            _ => false,
        }
    }

    /// Move to `next`, rejecting transitions the lifecycle does not allow.
    pub fn transition(self, next: SessionPhase) -> Result<SessionPhase, DomainError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(DomainError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let phase = SessionPhase::Idle
            .transition(SessionPhase::Attaching)
            .and_then(|p| p.transition(SessionPhase::Attached))
            .and_then(|p| p.transition(SessionPhase::Detached))
            .unwrap();
        assert_eq!(phase, SessionPhase::Detached);
    }

    #[test]
    fn test_failed_attach_can_be_retried() {
        let phase = SessionPhase::Attaching
            .transition(SessionPhase::Failed)
            .unwrap();
        assert!(phase.accepts_attach());
        assert!(!phase.is_attached());
        assert!(phase.transition(SessionPhase::Attaching).is_ok());
    }

    #[test]
    fn test_cannot_skip_attaching() {
        assert!(SessionPhase::Idle.transition(SessionPhase::Attached).is_err());
        assert!(SessionPhase::Failed.transition(SessionPhase::Attached).is_err());
    }

    #[test]
    fn test_attached_rejects_second_attach() {
        assert!(!SessionPhase::Attached.accepts_attach());
        assert!(SessionPhase::Attached.transition(SessionPhase::Attaching).is_err());
    }
}
