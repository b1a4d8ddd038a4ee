//! Reconcile breakpoints use case
//!
//! Turns a new desired breakpoint list for one source into the minimal set
//! of remove/add calls against the browser, and records the outcome in the
//! [`BreakpointStore`].
//!
//! The caller is responsible for holding the per-source lock
//! ([`PathLocks`](super::path_locks::PathLocks)) for the whole call.
//!
//! # Failure handling
//!
//! - A failed remove is logged; the local entry is already gone.
//! - A failed add leaves that position unverified; nothing is recorded.
//! - A lost connection aborts the reconciliation. Calls that completed
//!   before the loss stay committed; nothing is rolled back.

use crate::ports::cdp_transport::{CdpTransport, SetBreakpointResult, TransportError};
use browser_dap_domain::{BreakpointId, BreakpointStatus, BreakpointStore, Position};
use futures::future::join_all;
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that abort a reconciliation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    #[error("Connection lost during reconciliation: {0}")]
    ConnectionLost(String),
}

/// What a reconciliation did, for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Live breakpoints removed through the browser (successfully or not).
    pub removed: Vec<BreakpointId>,
    /// Stale breakpoints dropped locally.
    pub purged_stale: usize,
    /// Add calls issued.
    pub added: usize,
    /// Add calls that failed.
    pub failed_adds: usize,
}

/// Result of a completed reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// One status per requested position, in request order.
    pub statuses: Vec<BreakpointStatus>,
    pub report: ReconcileReport,
    /// The source was reloaded and its script parsed again while adds were
    /// in flight. Those adds were committed stale and nothing else will
    /// re-add them, so the caller must reconcile again.
    pub needs_resync: bool,
}

/// Diffs desired breakpoints against the store and drives the transport.
pub struct BreakpointReconciler<'a> {
    transport: &'a dyn CdpTransport,
    store: &'a Mutex<BreakpointStore>,
}

impl<'a> BreakpointReconciler<'a> {
    pub fn new(transport: &'a dyn CdpTransport, store: &'a Mutex<BreakpointStore>) -> Self {
        Self { transport, store }
    }

    /// Make the browser's breakpoints for `source_url` match `desired`.
    pub async fn reconcile(
        &self,
        source_url: &str,
        desired: &[Position],
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let plan = self.lock_store().plan(source_url, desired);
        let mut report = ReconcileReport {
            removed: plan.remove.clone(),
            purged_stale: plan.purged_stale,
            ..Default::default()
        };

        if plan.is_noop() {
            debug!(
                "Reconcile {}: nothing to do ({} stale purged)",
                source_url, plan.purged_stale
            );
            let statuses = self.lock_store().finish(source_url);
            return Ok(ReconcileOutcome {
                statuses,
                report,
                needs_resync: false,
            });
        }

        let mut lost: Option<String> = None;

        let removals = join_all(
            plan.remove
                .iter()
                .map(|id| async move { (id, self.transport.remove_breakpoint(id).await) }),
        )
        .await;
        for (id, result) in removals {
            match result {
                Ok(()) => debug!("Removed breakpoint {}", id),
                Err(TransportError::ConnectionLost(reason)) => {
                    lost.get_or_insert(reason);
                }
                Err(e) => warn!("Failed to remove breakpoint {}: {}", id, e),
            }
        }

        if let Some(reason) = lost {
            let _ = self.lock_store().finish(source_url);
            return Err(ReconcileError::ConnectionLost(reason));
        }

        let additions = join_all(plan.add.iter().map(|&position| async move {
            (
                position,
                self.transport
                    .set_breakpoint_by_url(source_url, position)
                    .await,
            )
        }))
        .await;
        report.added = additions.len();

        let mut lost: Option<String> = None;
        {
            let mut store = self.lock_store();
            for (position, result) in additions {
                match result {
                    Ok(SetBreakpointResult {
                        breakpoint_id,
                        locations,
                    }) => {
                        let id_for_log = breakpoint_id.clone();
                        if !store.commit(plan.epoch, source_url, position, breakpoint_id, &locations)
                        {
                            warn!(
                                "Browser reused breakpoint id {} for {} at {}",
                                id_for_log, source_url, position
                            );
                            report.failed_adds += 1;
                        }
                    }
                    Err(TransportError::ConnectionLost(reason)) => {
                        report.failed_adds += 1;
                        lost.get_or_insert(reason);
                    }
                    Err(e) => {
                        warn!(
                            "Failed to set breakpoint at {}:{}: {}",
                            source_url, position, e
                        );
                        report.failed_adds += 1;
                    }
                }
            }
            let statuses = store.finish(source_url);
            let needs_resync = plan.epoch < store.epoch()
                && store.script_for(source_url).is_some()
                && store
                    .entry(source_url)
                    .is_some_and(|e| e.has_stale(store.epoch()));

            if lost.is_none() {
                debug!(
                    "Reconcile {}: removed {}, purged {}, added {} ({} failed)",
                    source_url,
                    report.removed.len(),
                    report.purged_stale,
                    report.added,
                    report.failed_adds
                );
                return Ok(ReconcileOutcome {
                    statuses,
                    report,
                    needs_resync,
                });
            }
        }

        Err(ReconcileError::ConnectionLost(lost.unwrap_or_default()))
    }

    fn lock_store(&self) -> std::sync::MutexGuard<'_, BreakpointStore> {
        self.store.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::test_support::{MockTransport, settle};
    use browser_dap_domain::{Resolution, ScriptId};

    const URL: &str = "file:///a.js";

    fn p(line: u32, column: u32) -> Position {
        Position::new(line, column)
    }

    #[tokio::test]
    async fn test_immediate_resolution_is_recorded() {
        let transport = MockTransport::new();
        transport.load_script(URL, "S");
        let store = Mutex::new(BreakpointStore::new());
        let reconciler = BreakpointReconciler::new(transport.as_ref(), &store);

        let outcome = reconciler.reconcile(URL, &[p(5, 6)]).await.unwrap();

        assert_eq!(
            outcome.statuses,
            vec![BreakpointStatus {
                position: p(5, 6),
                verified: true
            }]
        );
        let store = store.lock().unwrap();
        let committed = store.committed(URL);
        assert_eq!(committed[0].id, BreakpointId::from("bpId0"));
        assert_eq!(committed[0].resolution, Resolution::Resolved(ScriptId::from("S")));
    }

    #[tokio::test]
    async fn test_report_counts_removes_and_adds() {
        let transport = MockTransport::new();
        let store = Mutex::new(BreakpointStore::new());
        let reconciler = BreakpointReconciler::new(transport.as_ref(), &store);

        reconciler.reconcile(URL, &[p(1, 0), p(2, 0)]).await.unwrap();
        let outcome = reconciler.reconcile(URL, &[p(2, 0), p(3, 0)]).await.unwrap();

        assert_eq!(outcome.report.removed, vec![BreakpointId::from("bpId0")]);
        assert_eq!(outcome.report.added, 1);
        assert_eq!(outcome.report.failed_adds, 0);
        assert_eq!(outcome.report.purged_stale, 0);
    }

    #[tokio::test]
    async fn test_add_failure_is_unverified_and_not_committed() {
        let transport = MockTransport::new();
        transport.fail_add_at(p(2, 0));
        let store = Mutex::new(BreakpointStore::new());
        let reconciler = BreakpointReconciler::new(transport.as_ref(), &store);

        let outcome = reconciler
            .reconcile(URL, &[p(1, 0), p(2, 0), p(3, 0)])
            .await
            .unwrap();

        let verified: Vec<bool> = outcome.statuses.iter().map(|s| s.verified).collect();
        assert_eq!(verified, vec![true, false, true]);
        assert_eq!(outcome.report.failed_adds, 1);
        assert_eq!(store.lock().unwrap().committed(URL).len(), 2);
    }

    #[tokio::test]
    async fn test_failed_add_is_retried_on_next_reconcile() {
        let transport = MockTransport::new();
        transport.fail_add_at(p(2, 0));
        let store = Mutex::new(BreakpointStore::new());
        let reconciler = BreakpointReconciler::new(transport.as_ref(), &store);

        reconciler.reconcile(URL, &[p(2, 0)]).await.unwrap();
        transport.clear_calls();
        reconciler.reconcile(URL, &[p(2, 0)]).await.unwrap();

        assert_eq!(transport.adds(), vec![(URL.to_string(), p(2, 0))]);
    }

    #[tokio::test]
    async fn test_connection_lost_keeps_completed_adds() {
        let transport = MockTransport::new();
        transport.lose_connection_on_add(p(2, 0));
        let store = Mutex::new(BreakpointStore::new());
        let reconciler = BreakpointReconciler::new(transport.as_ref(), &store);

        let err = reconciler
            .reconcile(URL, &[p(1, 0), p(2, 0)])
            .await
            .unwrap_err();

        assert!(matches!(err, ReconcileError::ConnectionLost(_)));
        let store = store.lock().unwrap();
        let committed = store.committed(URL);
        assert_eq!(committed.len(), 1);
        assert_eq!(committed[0].position, p(1, 0));
    }

    #[tokio::test]
    async fn test_reload_with_parsed_script_during_add_needs_resync() {
        let transport = MockTransport::new();
        let store = Mutex::new(BreakpointStore::new());
        let reconciler = BreakpointReconciler::new(transport.as_ref(), &store);
        transport.gate(URL);

        let reload = async {
            settle(|| transport.adds().len() == 1).await;
            {
                let mut store = store.lock().unwrap();
                store.advance_epoch();
                store.record_script(URL, ScriptId::from("S2"));
            }
            transport.open_gate(URL);
        };
        let desired = [p(1, 0)];
        let (outcome, ()) = tokio::join!(reconciler.reconcile(URL, &desired), reload);

        assert!(outcome.unwrap().needs_resync);
        let store = store.lock().unwrap();
        assert!(store.committed(URL)[0].is_stale(store.epoch()));
    }

    #[tokio::test]
    async fn test_reload_without_parsed_script_leaves_resync_to_script_event() {
        let transport = MockTransport::new();
        let store = Mutex::new(BreakpointStore::new());
        let reconciler = BreakpointReconciler::new(transport.as_ref(), &store);
        transport.gate(URL);

        let reload = async {
            settle(|| transport.adds().len() == 1).await;
            store.lock().unwrap().advance_epoch();
            transport.open_gate(URL);
        };
        let desired = [p(1, 0)];
        let (outcome, ()) = tokio::join!(reconciler.reconcile(URL, &desired), reload);

        assert!(!outcome.unwrap().needs_resync);
    }
}
