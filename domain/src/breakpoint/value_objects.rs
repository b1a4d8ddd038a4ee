//! Breakpoint value objects - immutable types shared by the store and the
//! reconciler.
//!
//! # Identifiers
//! - [`BreakpointId`] - Opaque id issued by the browser for a registered breakpoint
//! - [`ScriptId`] - Opaque id of a parsed script, valid for one epoch
//!
//! # Locations
//! - [`Position`] - A 0-based `(line, column)` pair in browser coordinates
//! - [`ResolvedLocation`] - A position bound to a concrete script
//!
//! # Bookkeeping
//! - [`Epoch`] - Execution context generation
//! - [`BreakpointStatus`] - One entry of a `setBreakpoints` response

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Identifier the browser assigns to a breakpoint.
///
/// Stable for as long as the breakpoint stays registered; a remove followed
/// by an add always yields a new id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BreakpointId(String);

impl BreakpointId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BreakpointId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for BreakpointId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for BreakpointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a script parsed by the browser.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScriptId(String);

impl ScriptId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ScriptId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ScriptId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for ScriptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A `(line, column)` pair in browser (0-based) coordinates.
///
/// Two breakpoints in the same source are the same logical breakpoint
/// exactly when their positions are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Convert a client position to browser coordinates.
    ///
    /// `line_base` / `column_base` are the client's first line and column
    /// (0 or 1). A missing column means "start of line".
    pub fn from_client(
        line: i64,
        column: Option<i64>,
        line_base: u32,
        column_base: u32,
    ) -> Result<Self, DomainError> {
        let line = line
            .checked_sub(i64::from(line_base))
            .and_then(|l| u32::try_from(l).ok())
            .ok_or_else(|| DomainError::InvalidPosition(format!("line {line} is out of range")))?;
        let column = match column {
            None => 0,
            Some(c) => c
                .checked_sub(i64::from(column_base))
                .and_then(|c| u32::try_from(c).ok())
                .ok_or_else(|| {
                    DomainError::InvalidPosition(format!("column {c} is out of range"))
                })?,
        };
        Ok(Self { line, column })
    }

    /// Convert back to client coordinates, the inverse of [`from_client`](Self::from_client).
    pub fn to_client(self, line_base: u32, column_base: u32) -> (i64, i64) {
        (
            i64::from(self.line) + i64::from(line_base),
            i64::from(self.column) + i64::from(column_base),
        )
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A position inside a specific parsed script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub script_id: ScriptId,
    pub position: Position,
}

impl ResolvedLocation {
    pub fn new(script_id: impl Into<ScriptId>, line: u32, column: u32) -> Self {
        Self {
            script_id: script_id.into(),
            position: Position::new(line, column),
        }
    }
}

/// Execution context generation.
///
/// Advanced on every context clear; anything the browser handed out in an
/// earlier epoch is no longer known to it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Epoch(u64);

impl Epoch {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for Epoch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One entry of a breakpoint-set response, in request order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakpointStatus {
    pub position: Position,
    /// The browser accepted a breakpoint at this position. Resolution to a
    /// script is not required.
    pub verified: bool,
}
