//! Session controller
//!
//! Owns one debug session: the lifecycle phase, the breakpoint store, the
//! per-source locks and the task that drains the transport's event stream.
//! The IDE-facing layer only talks to this type.

use crate::ports::browser_launcher::{BrowserLauncher, LaunchRequest};
use crate::ports::cdp_transport::{AttachTarget, CdpTransport, EventReceiver};
use crate::ports::path_resolver::PathResolver;
use crate::use_cases::path_locks::PathLocks;
use crate::use_cases::reconcile_breakpoints::{
    BreakpointReconciler, ReconcileError, ReconcileOutcome,
};
use crate::use_cases::translate_event::EventTranslator;
use browser_dap_domain::{BreakpointStatus, BreakpointStore, CdpEvent, IdeEvent, Position, SessionPhase};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Session-level failures surfaced to the IDE
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Not attached to a browser")]
    NotAttached,

    #[error("Attach failed: {0}")]
    Attach(String),

    #[error("Connection to the browser lost: {0}")]
    ConnectionLost(String),

    #[error("Launch failed: {0}")]
    Launch(String),
}

type Dispatch = (CancellationToken, JoinHandle<()>);

/// One debug session against one browser target.
pub struct SessionController {
    transport: Arc<dyn CdpTransport>,
    launcher: Arc<dyn BrowserLauncher>,
    paths: Arc<dyn PathResolver>,
    phase: Mutex<SessionPhase>,
    store: Mutex<BreakpointStore>,
    locks: PathLocks,
    ide_tx: mpsc::UnboundedSender<IdeEvent>,
    dispatch: Mutex<Option<Dispatch>>,
}

impl SessionController {
    /// Create an idle session and the receiver for its IDE events.
    pub fn new(
        transport: Arc<dyn CdpTransport>,
        launcher: Arc<dyn BrowserLauncher>,
        paths: Arc<dyn PathResolver>,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<IdeEvent>) {
        let (ide_tx, ide_rx) = mpsc::unbounded_channel();
        let controller = Arc::new(Self {
            transport,
            launcher,
            paths,
            phase: Mutex::new(SessionPhase::Idle),
            store: Mutex::new(BreakpointStore::new()),
            locks: PathLocks::new(),
            ide_tx,
            dispatch: Mutex::new(None),
        });
        (controller, ide_rx)
    }

    pub fn phase(&self) -> SessionPhase {
        *self.lock_phase()
    }

    /// Connect to a running browser.
    ///
    /// Emits `initialized` exactly once on success. On failure the session
    /// is left `Failed` with an empty store and nothing is emitted.
    pub async fn attach(self: &Arc<Self>, target: AttachTarget) -> Result<(), SessionError> {
        {
            let mut phase = self.lock_phase();
            if !phase.accepts_attach() {
                return Err(SessionError::Attach("already attached".into()));
            }
            *phase = phase
                .transition(SessionPhase::Attaching)
                .map_err(|e| SessionError::Attach(e.to_string()))?;
        }

        // A previous connection may have died without an explicit detach
        self.stop_dispatch().await;
        self.lock_store().reset();

        info!("Attaching to browser on port {}", target.port);
        match self.transport.attach(&target).await {
            Ok(events) => {
                self.set_phase(SessionPhase::Attached);
                let _ = self.ide_tx.send(IdeEvent::Initialized);

                let cancel = CancellationToken::new();
                let handle = tokio::spawn(Arc::clone(self).run_dispatch(events, cancel.clone()));
                *self.lock_dispatch() = Some((cancel, handle));
                info!("Attached to browser on port {}", target.port);
                Ok(())
            }
            Err(e) => {
                warn!("Attach to port {} failed: {}", target.port, e);
                self.set_phase(SessionPhase::Failed);
                Err(SessionError::Attach(e.to_string()))
            }
        }
    }

    /// Start a browser and attach to it.
    ///
    /// If the attach fails the browser that was just started is stopped.
    pub async fn launch(self: &Arc<Self>, request: LaunchRequest) -> Result<(), SessionError> {
        if !self.phase().accepts_attach() {
            return Err(SessionError::Attach("already attached".into()));
        }

        let browser = self
            .launcher
            .launch(&request)
            .await
            .map_err(|e| SessionError::Launch(e.to_string()))?;
        info!(
            "Launched browser (pid {:?}) on port {}",
            browser.pid, browser.port
        );

        let mut target = AttachTarget::new(browser.port);
        target.url = browser.url;

        if let Err(e) = self.attach(target).await {
            self.launcher.terminate().await;
            return Err(e);
        }
        Ok(())
    }

    /// Replace the breakpoints of one source.
    ///
    /// Returns one status per requested position, in request order.
    /// Reconciliations of the same source never overlap.
    pub async fn set_breakpoints(
        &self,
        path: &str,
        desired: &[Position],
    ) -> Result<Vec<BreakpointStatus>, SessionError> {
        if !self.phase().is_attached() {
            return Err(SessionError::NotAttached);
        }
        let url = self.paths.to_url(path);

        let _guard = self.locks.acquire(&url).await;
        if !self.phase().is_attached() {
            return Err(SessionError::NotAttached);
        }

        match self.reconcile_locked(&url, desired).await {
            Ok(outcome) => Ok(outcome.statuses),
            Err(ReconcileError::ConnectionLost(reason)) => {
                self.mark_lost(&reason);
                Err(SessionError::ConnectionLost(reason))
            }
        }
    }

    /// Re-add the last desired breakpoints of `url` after a reload.
    async fn resync(&self, url: &str) {
        let _guard = self.locks.acquire(url).await;
        if !self.phase().is_attached() {
            return;
        }
        let Some(desired) = self.lock_store().desired(url) else {
            return;
        };

        match self.reconcile_locked(url, &desired).await {
            Ok(outcome) => debug!(
                "Resynced {}: {} of {} positions verified",
                url,
                outcome.statuses.iter().filter(|s| s.verified).count(),
                outcome.statuses.len()
            ),
            Err(ReconcileError::ConnectionLost(reason)) => self.mark_lost(&reason),
        }
    }

    /// Reconcile a source whose lock the caller holds.
    ///
    /// Runs again while a reload overtook the add calls, so breakpoints end
    /// up registered in the newest execution context.
    async fn reconcile_locked(
        &self,
        url: &str,
        desired: &[Position],
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let reconciler = BreakpointReconciler::new(self.transport.as_ref(), &self.store);
        let mut outcome = reconciler.reconcile(url, desired).await?;
        while outcome.needs_resync && self.phase().is_attached() {
            debug!("{} reloaded during reconciliation, adding again", url);
            outcome = reconciler.reconcile(url, desired).await?;
        }
        Ok(outcome)
    }

    /// Apply one browser event. Returns the source that needs a resync.
    fn apply_event(&self, event: CdpEvent) -> Option<String> {
        let translation = {
            let mut store = self.lock_store();
            EventTranslator::translate(&mut store, event)
        };

        for event in translation.ide_events {
            let _ = self.ide_tx.send(event);
        }
        if let Some(reason) = translation.connection_lost {
            self.mark_lost(&reason);
        }
        translation.resync
    }

    /// Drain the transport's events until cancelled or the connection ends.
    ///
    /// Reload resyncs run on tasks owned by this loop and are aborted with
    /// it, so none of them outlives the session that scheduled it.
    async fn run_dispatch(self: Arc<Self>, mut events: EventReceiver, cancel: CancellationToken) {
        let mut resyncs = JoinSet::new();
        loop {
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                Some(_) = resyncs.join_next(), if !resyncs.is_empty() => continue,
                event = events.recv() => event,
            };

            let Some(event) = event else {
                self.mark_lost("event stream closed");
                break;
            };
            let lost = matches!(event, CdpEvent::ConnectionLost { .. });

            if let Some(url) = self.apply_event(event) {
                let this = Arc::clone(&self);
                resyncs.spawn(async move { this.resync(&url).await });
            }
            if lost {
                break;
            }
        }
        resyncs.shutdown().await;
        debug!("Event dispatch stopped");
    }

    /// Leave the browser running and end the session.
    pub async fn detach(&self) {
        self.stop_dispatch().await;
        self.transport.detach().await;

        let mut phase = self.lock_phase();
        if let Ok(next) = phase.transition(SessionPhase::Detached) {
            *phase = next;
            info!("Detached");
        }
    }

    /// Detach and stop a browser this session launched.
    pub async fn disconnect(&self) {
        self.detach().await;
        self.launcher.terminate().await;
    }

    async fn stop_dispatch(&self) {
        let dispatch = self.lock_dispatch().take();
        if let Some((cancel, handle)) = dispatch {
            cancel.cancel();
            let _ = handle.await;
        }
    }

    /// Move an attached session to `Detached` and tell the IDE, once.
    fn mark_lost(&self, reason: &str) {
        {
            let mut phase = self.lock_phase();
            if !phase.is_attached() {
                return;
            }
            match phase.transition(SessionPhase::Detached) {
                Ok(next) => *phase = next,
                Err(_) => return,
            }
        }
        warn!("Browser connection lost: {}", reason);
        let _ = self.ide_tx.send(IdeEvent::Terminated);
    }

    fn set_phase(&self, next: SessionPhase) {
        let mut phase = self.lock_phase();
        match phase.transition(next) {
            Ok(next) => *phase = next,
            Err(e) => debug!("Ignoring phase change: {}", e),
        }
    }

    fn lock_phase(&self) -> MutexGuard<'_, SessionPhase> {
        self.phase.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_store(&self) -> MutexGuard<'_, BreakpointStore> {
        self.store.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_dispatch(&self) -> MutexGuard<'_, Option<Dispatch>> {
        self.dispatch.lock().unwrap_or_else(|e| e.into_inner())
    }
}
