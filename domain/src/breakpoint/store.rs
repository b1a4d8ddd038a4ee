//! Breakpoint store - per-source desired/committed state plus the epoch.
//!
//! The store is pure data. It never talks to the browser; the reconciler
//! asks it for a [`ReconcilePlan`], performs the calls, and reports each
//! outcome back through [`BreakpointStore::commit`].
//!
//! # Invariants
//!
//! - Committed breakpoints of one source never share an id.
//! - A breakpoint is resolved only while its epoch is current.
//! - Entries are created on first use and never removed (except by
//!   [`reset`](BreakpointStore::reset) when a new session starts).

use super::entities::{CommittedBreakpoint, Resolution, SourceEntry};
use super::value_objects::{
    BreakpointId, BreakpointStatus, Epoch, Position, ResolvedLocation, ScriptId,
};
use std::collections::{HashMap, HashSet};

/// The calls needed to move one source from its committed state to a new
/// desired list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub source_url: String,
    /// Epoch the plan was computed in; adds are committed against it.
    pub epoch: Epoch,
    /// Live breakpoints that are no longer wanted. Already dropped locally.
    pub remove: Vec<BreakpointId>,
    /// Unique positions with no committed breakpoint, in request order.
    pub add: Vec<Position>,
    /// Stale breakpoints dropped locally without a browser call.
    pub purged_stale: usize,
}

impl ReconcilePlan {
    /// No browser calls are needed.
    pub fn is_noop(&self) -> bool {
        self.remove.is_empty() && self.add.is_empty()
    }
}

/// Breakpoint registry for one debug session.
#[derive(Debug, Default)]
pub struct BreakpointStore {
    entries: HashMap<String, SourceEntry>,
    epoch: Epoch,
    /// Latest script id seen per URL in the current epoch.
    scripts: HashMap<String, ScriptId>,
}

impl BreakpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn entry(&self, source_url: &str) -> Option<&SourceEntry> {
        self.entries.get(source_url)
    }

    pub fn committed(&self, source_url: &str) -> &[CommittedBreakpoint] {
        self.entries
            .get(source_url)
            .map(|e| e.committed.as_slice())
            .unwrap_or(&[])
    }

    /// Last desired list accepted for `source_url`.
    pub fn desired(&self, source_url: &str) -> Option<Vec<Position>> {
        self.entries.get(source_url).map(|e| e.desired.clone())
    }

    pub fn script_for(&self, source_url: &str) -> Option<&ScriptId> {
        self.scripts.get(source_url)
    }

    /// Accept a new desired list and compute the diff against what is
    /// committed.
    ///
    /// Stale breakpoints are purged here (the browser no longer knows their
    /// ids) and unwanted live ones are dropped and returned for removal.
    pub fn plan(&mut self, source_url: &str, desired: &[Position]) -> ReconcilePlan {
        let epoch = self.epoch;
        let entry = self
            .entries
            .entry(source_url.to_string())
            .or_insert_with(|| SourceEntry::new(source_url));
        entry.desired = desired.to_vec();

        let before = entry.committed.len();
        entry.committed.retain(|bp| !bp.is_stale(epoch));
        let purged_stale = before - entry.committed.len();

        let wanted: HashSet<Position> = desired.iter().copied().collect();
        let mut remove = Vec::new();
        entry.committed.retain(|bp| {
            if wanted.contains(&bp.position) {
                true
            } else {
                remove.push(bp.id.clone());
                false
            }
        });

        let mut seen = HashSet::new();
        let add = desired
            .iter()
            .copied()
            .filter(|p| seen.insert(*p) && entry.find(*p).is_none())
            .collect();

        ReconcilePlan {
            source_url: source_url.to_string(),
            epoch,
            remove,
            add,
            purged_stale,
        }
    }

    /// Record a breakpoint the browser accepted for a plan.
    ///
    /// Returns `false` (and records nothing) when the id is already present
    /// for that source. If the epoch advanced while the call was in flight
    /// the breakpoint is recorded as stale and unresolved.
    pub fn commit(
        &mut self,
        plan_epoch: Epoch,
        source_url: &str,
        position: Position,
        id: BreakpointId,
        locations: &[ResolvedLocation],
    ) -> bool {
        let current = self.epoch;
        let entry = self
            .entries
            .entry(source_url.to_string())
            .or_insert_with(|| SourceEntry::new(source_url));
        if entry.contains_id(&id) {
            return false;
        }
        let mut bp = CommittedBreakpoint::new(id, source_url, position, locations, plan_epoch);
        if bp.is_stale(current) {
            bp.resolution = Resolution::Unresolved;
        }
        entry.committed.push(bp);
        true
    }

    /// Restore request order on the committed list and build the response
    /// statuses, one per desired position (duplicates included).
    pub fn finish(&mut self, source_url: &str) -> Vec<BreakpointStatus> {
        let Some(entry) = self.entries.get_mut(source_url) else {
            return Vec::new();
        };
        let desired = &entry.desired;
        let rank = |p: Position| desired.iter().position(|d| *d == p).unwrap_or(usize::MAX);
        entry.committed.sort_by_key(|bp| rank(bp.position));

        entry
            .desired
            .iter()
            .map(|&position| BreakpointStatus {
                position,
                verified: entry.find(position).is_some(),
            })
            .collect()
    }

    /// Bind a live breakpoint to a script.
    ///
    /// Returns `false` for ids that are not tracked in the current epoch;
    /// those are stale-epoch noise.
    pub fn resolve(&mut self, id: &BreakpointId, script_id: ScriptId) -> bool {
        let epoch = self.epoch;
        let found = self
            .entries
            .values_mut()
            .flat_map(|e| e.committed.iter_mut())
            .find(|bp| &bp.id == id && !bp.is_stale(epoch));
        match found {
            Some(bp) => {
                bp.resolution = Resolution::Resolved(script_id);
                true
            }
            None => false,
        }
    }

    /// Start a new execution context generation.
    ///
    /// Every committed breakpoint becomes unresolved and stale. Nothing is
    /// removed; stale entries are purged by the next plan for their source.
    pub fn advance_epoch(&mut self) -> Epoch {
        self.epoch = self.epoch.next();
        for bp in self.entries.values_mut().flat_map(|e| e.committed.iter_mut()) {
            bp.resolution = Resolution::Unresolved;
        }
        self.scripts.clear();
        self.epoch
    }

    /// Remember a parsed script.
    ///
    /// Returns `true` when the URL has stale breakpoints, i.e. a reload
    /// brought back a source whose breakpoints must be re-added.
    pub fn record_script(&mut self, url: &str, script_id: ScriptId) -> bool {
        self.scripts.insert(url.to_string(), script_id);
        let epoch = self.epoch;
        self.entries.get(url).is_some_and(|e| e.has_stale(epoch))
    }

    /// Forget everything, including the epoch. Used when a new session attaches.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn source_count(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "file:///a.js";

    fn p(line: u32, column: u32) -> Position {
        Position::new(line, column)
    }

    fn commit_all(store: &mut BreakpointStore, plan: &ReconcilePlan, prefix: &str) {
        for (i, pos) in plan.add.iter().enumerate() {
            store.commit(
                plan.epoch,
                &plan.source_url,
                *pos,
                BreakpointId::new(format!("{prefix}{i}")),
                &[],
            );
        }
    }

    #[test]
    fn test_first_plan_adds_every_unique_position() {
        let mut store = BreakpointStore::new();
        let plan = store.plan(URL, &[p(1, 0), p(2, 0), p(1, 0)]);
        assert_eq!(plan.add, vec![p(1, 0), p(2, 0)]);
        assert!(plan.remove.is_empty());
        assert_eq!(plan.purged_stale, 0);
    }

    #[test]
    fn test_same_desired_list_is_noop() {
        let mut store = BreakpointStore::new();
        let plan = store.plan(URL, &[p(1, 0), p(2, 0)]);
        commit_all(&mut store, &plan, "bp");

        let again = store.plan(URL, &[p(1, 0), p(2, 0)]);
        assert!(again.is_noop());
    }

    #[test]
    fn test_dropped_position_is_removed_and_kept_one_is_not_re_added() {
        let mut store = BreakpointStore::new();
        let plan = store.plan(URL, &[p(1, 0), p(2, 0)]);
        commit_all(&mut store, &plan, "bp");

        let next = store.plan(URL, &[p(1, 0)]);
        assert_eq!(next.remove, vec![BreakpointId::from("bp1")]);
        assert!(next.add.is_empty());
        assert_eq!(store.committed(URL).len(), 1);
    }

    #[test]
    fn test_finish_reports_duplicates_and_request_order() {
        let mut store = BreakpointStore::new();
        let plan = store.plan(URL, &[p(3, 0), p(1, 0), p(3, 0)]);
        // Commit in reverse to make sure finish restores request order
        store.commit(plan.epoch, URL, p(1, 0), BreakpointId::from("b"), &[]);
        store.commit(plan.epoch, URL, p(3, 0), BreakpointId::from("a"), &[]);

        let statuses = store.finish(URL);
        let positions: Vec<_> = statuses.iter().map(|s| s.position).collect();
        assert_eq!(positions, vec![p(3, 0), p(1, 0), p(3, 0)]);
        assert!(statuses.iter().all(|s| s.verified));
        assert_eq!(store.committed(URL)[0].id, BreakpointId::from("a"));
    }

    #[test]
    fn test_finish_marks_uncommitted_positions_unverified() {
        let mut store = BreakpointStore::new();
        let plan = store.plan(URL, &[p(1, 0), p(2, 0)]);
        store.commit(plan.epoch, URL, p(2, 0), BreakpointId::from("x"), &[]);

        let statuses = store.finish(URL);
        assert!(!statuses[0].verified);
        assert!(statuses[1].verified);
    }

    #[test]
    fn test_commit_rejects_duplicate_id() {
        let mut store = BreakpointStore::new();
        let plan = store.plan(URL, &[p(1, 0), p(2, 0)]);
        assert!(store.commit(plan.epoch, URL, p(1, 0), BreakpointId::from("x"), &[]));
        assert!(!store.commit(plan.epoch, URL, p(2, 0), BreakpointId::from("x"), &[]));
        assert_eq!(store.committed(URL).len(), 1);
    }

    #[test]
    fn test_resolve_matches_by_id_and_ignores_unknown() {
        let mut store = BreakpointStore::new();
        let plan = store.plan(URL, &[p(1, 0)]);
        commit_all(&mut store, &plan, "bp");

        assert!(store.resolve(&BreakpointId::from("bp0"), ScriptId::from("S")));
        assert!(!store.resolve(&BreakpointId::from("nope"), ScriptId::from("S")));
        assert_eq!(
            store.committed(URL)[0].resolution,
            Resolution::Resolved(ScriptId::from("S"))
        );
    }

    #[test]
    fn test_advance_epoch_unresolves_and_marks_stale() {
        let mut store = BreakpointStore::new();
        let plan = store.plan(URL, &[p(1, 0)]);
        store.commit(
            plan.epoch,
            URL,
            p(1, 0),
            BreakpointId::from("bp0"),
            &[ResolvedLocation::new("S", 1, 0)],
        );

        let epoch = store.advance_epoch();
        assert_eq!(epoch.value(), 1);
        let bp = &store.committed(URL)[0];
        assert!(!bp.resolution.is_resolved());
        assert!(bp.is_stale(epoch));
        // Stale ids no longer resolve
        assert!(!store.resolve(&BreakpointId::from("bp0"), ScriptId::from("S2")));
    }

    #[test]
    fn test_plan_after_reload_purges_stale_without_remove_calls() {
        let mut store = BreakpointStore::new();
        let plan = store.plan(URL, &[p(1, 0), p(2, 0)]);
        commit_all(&mut store, &plan, "old");
        store.advance_epoch();

        let next = store.plan(URL, &[p(1, 0), p(2, 0), p(3, 0)]);
        assert_eq!(next.purged_stale, 2);
        assert!(next.remove.is_empty());
        assert_eq!(next.add, vec![p(1, 0), p(2, 0), p(3, 0)]);
        assert!(store.committed(URL).is_empty());
    }

    #[test]
    fn test_record_script_reports_stale_sources_only() {
        let mut store = BreakpointStore::new();
        let plan = store.plan(URL, &[p(1, 0)]);
        commit_all(&mut store, &plan, "bp");

        assert!(!store.record_script(URL, ScriptId::from("S1")));
        store.advance_epoch();
        assert!(store.script_for(URL).is_none());
        assert!(store.record_script(URL, ScriptId::from("S2")));
        assert!(!store.record_script("file:///other.js", ScriptId::from("S3")));
        assert_eq!(store.script_for(URL), Some(&ScriptId::from("S2")));
    }

    #[test]
    fn test_commit_across_epoch_change_is_stale_and_unresolved() {
        let mut store = BreakpointStore::new();
        let plan = store.plan(URL, &[p(1, 0)]);
        store.advance_epoch();
        store.commit(
            plan.epoch,
            URL,
            p(1, 0),
            BreakpointId::from("late"),
            &[ResolvedLocation::new("S", 1, 0)],
        );
        let bp = &store.committed(URL)[0];
        assert!(bp.is_stale(store.epoch()));
        assert!(!bp.resolution.is_resolved());
    }

    #[test]
    fn test_reset_clears_entries_and_epoch() {
        let mut store = BreakpointStore::new();
        store.plan(URL, &[p(1, 0)]);
        store.advance_epoch();
        store.reset();
        assert_eq!(store.source_count(), 0);
        assert_eq!(store.epoch(), Epoch::default());
    }
}
