//! Breakpoint entities - records with identity that the store mutates.

use super::value_objects::{BreakpointId, Epoch, Position, ResolvedLocation, ScriptId};
use serde::{Deserialize, Serialize};

/// Whether a committed breakpoint is bound to a parsed script.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Resolution {
    #[default]
    Unresolved,
    Resolved(ScriptId),
}

impl Resolution {
    pub fn script_id(&self) -> Option<&ScriptId> {
        match self {
            Resolution::Resolved(id) => Some(id),
            Resolution::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }
}

/// A breakpoint the browser has accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommittedBreakpoint {
    pub id: BreakpointId,
    pub source_url: String,
    pub position: Position,
    pub resolution: Resolution,
    /// Epoch in which the browser issued `id`.
    pub epoch: Epoch,
}

impl CommittedBreakpoint {
    /// Build a committed breakpoint from an add-call result.
    ///
    /// The first reported location (if any) resolves it immediately.
    pub fn new(
        id: BreakpointId,
        source_url: impl Into<String>,
        position: Position,
        locations: &[ResolvedLocation],
        epoch: Epoch,
    ) -> Self {
        let resolution = locations
            .first()
            .map(|loc| Resolution::Resolved(loc.script_id.clone()))
            .unwrap_or_default();
        Self {
            id,
            source_url: source_url.into(),
            position,
            resolution,
            epoch,
        }
    }

    /// Stale breakpoints belong to an epoch the browser has already forgotten.
    pub fn is_stale(&self, current: Epoch) -> bool {
        self.epoch < current
    }
}

/// Registry entry for one source URL.
///
/// `committed` is kept in the insertion order of the most recent commit round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEntry {
    pub source_url: String,
    /// Positions from the last accepted request, duplicates included.
    pub desired: Vec<Position>,
    pub committed: Vec<CommittedBreakpoint>,
}

impl SourceEntry {
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            desired: Vec::new(),
            committed: Vec::new(),
        }
    }

    pub fn find(&self, position: Position) -> Option<&CommittedBreakpoint> {
        self.committed.iter().find(|bp| bp.position == position)
    }

    pub fn contains_id(&self, id: &BreakpointId) -> bool {
        self.committed.iter().any(|bp| &bp.id == id)
    }

    pub fn has_stale(&self, current: Epoch) -> bool {
        self.committed.iter().any(|bp| bp.is_stale(current))
    }
}
