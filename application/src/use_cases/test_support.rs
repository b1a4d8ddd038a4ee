//! In-memory transport and launcher used by the use case tests.

use crate::ports::browser_launcher::{BrowserLauncher, LaunchError, LaunchRequest, LaunchedBrowser};
use crate::ports::cdp_transport::{
    AttachTarget, CdpTransport, EventReceiver, SetBreakpointResult, TransportError,
};
use async_trait::async_trait;
use browser_dap_domain::{BreakpointId, CdpEvent, Position, ResolvedLocation, ScriptId};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::{Notify, mpsc};

/// A call the core made against the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Attach(AttachTarget),
    Add { url: String, position: Position },
    Remove(BreakpointId),
    Detach,
}

/// Scriptable [`CdpTransport`] that records every call.
#[derive(Default)]
pub struct MockTransport {
    calls: Mutex<Vec<Call>>,
    next_id: Mutex<u32>,
    attach_error: Mutex<Option<TransportError>>,
    events: Mutex<Option<mpsc::UnboundedSender<CdpEvent>>>,
    failing_adds: Mutex<HashSet<Position>>,
    lost_on_add: Mutex<Option<Position>>,
    fail_removes: Mutex<bool>,
    /// Scripts currently loaded per URL; adds resolve immediately against them.
    scripts: Mutex<HashMap<String, ScriptId>>,
    /// Adds for a gated URL wait until the gate is notified.
    gates: Mutex<HashMap<String, Arc<Notify>>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn adds(&self) -> Vec<(String, Position)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Add { url, position } => Some((url, position)),
                _ => None,
            })
            .collect()
    }

    pub fn removes(&self) -> Vec<BreakpointId> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Remove(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn fail_attach(&self, error: TransportError) {
        *self.attach_error.lock().unwrap() = Some(error);
    }

    pub fn fail_add_at(&self, position: Position) {
        self.failing_adds.lock().unwrap().insert(position);
    }

    pub fn lose_connection_on_add(&self, position: Position) {
        *self.lost_on_add.lock().unwrap() = Some(position);
    }

    pub fn fail_removes(&self) {
        *self.fail_removes.lock().unwrap() = true;
    }

    pub fn load_script(&self, url: &str, script_id: &str) {
        self.scripts
            .lock()
            .unwrap()
            .insert(url.to_string(), ScriptId::from(script_id));
    }

    pub fn unload_scripts(&self) {
        self.scripts.lock().unwrap().clear();
    }

    pub fn gate(&self, url: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert(url.to_string(), Arc::clone(&notify));
        notify
    }

    pub fn open_gate(&self, url: &str) {
        if let Some(notify) = self.gates.lock().unwrap().remove(url) {
            notify.notify_one();
        }
    }

    /// Push an event as if the browser sent it.
    pub fn emit(&self, event: CdpEvent) {
        if let Some(tx) = self.events.lock().unwrap().as_ref() {
            let _ = tx.send(event);
        }
    }

    /// Drop the event sender, closing the session's stream.
    pub fn close_events(&self) {
        self.events.lock().unwrap().take();
    }
}

#[async_trait]
impl CdpTransport for MockTransport {
    async fn attach(&self, target: &AttachTarget) -> Result<EventReceiver, TransportError> {
        self.calls.lock().unwrap().push(Call::Attach(target.clone()));
        if let Some(error) = self.attach_error.lock().unwrap().clone() {
            return Err(error);
        }
        let (tx, rx) = mpsc::unbounded_channel();
        *self.events.lock().unwrap() = Some(tx);
        Ok(rx)
    }

    async fn set_breakpoint_by_url(
        &self,
        url: &str,
        position: Position,
    ) -> Result<SetBreakpointResult, TransportError> {
        self.calls.lock().unwrap().push(Call::Add {
            url: url.to_string(),
            position,
        });

        let gate = self.gates.lock().unwrap().get(url).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if *self.lost_on_add.lock().unwrap() == Some(position) {
            return Err(TransportError::ConnectionLost("socket closed".into()));
        }
        if self.failing_adds.lock().unwrap().contains(&position) {
            return Err(TransportError::Call {
                method: "Debugger.setBreakpointByUrl".into(),
                message: "no script".into(),
            });
        }

        let breakpoint_id = {
            let mut next = self.next_id.lock().unwrap();
            let id = BreakpointId::new(format!("bpId{}", *next));
            *next += 1;
            id
        };
        let locations = self
            .scripts
            .lock()
            .unwrap()
            .get(url)
            .map(|script| {
                vec![ResolvedLocation {
                    script_id: script.clone(),
                    position,
                }]
            })
            .unwrap_or_default();

        Ok(SetBreakpointResult {
            breakpoint_id,
            locations,
        })
    }

    async fn remove_breakpoint(&self, id: &BreakpointId) -> Result<(), TransportError> {
        self.calls.lock().unwrap().push(Call::Remove(id.clone()));
        if *self.fail_removes.lock().unwrap() {
            return Err(TransportError::Call {
                method: "Debugger.removeBreakpoint".into(),
                message: "unknown breakpoint".into(),
            });
        }
        Ok(())
    }

    async fn detach(&self) {
        self.calls.lock().unwrap().push(Call::Detach);
        self.events.lock().unwrap().take();
    }
}

/// Launcher that records requests and hands out a fixed port.
#[derive(Default)]
pub struct MockLauncher {
    pub requests: Mutex<Vec<LaunchRequest>>,
    pub fail: Mutex<bool>,
    pub terminated: Mutex<u32>,
}

impl MockLauncher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl BrowserLauncher for MockLauncher {
    async fn launch(&self, request: &LaunchRequest) -> Result<LaunchedBrowser, LaunchError> {
        self.requests.lock().unwrap().push(request.clone());
        if *self.fail.lock().unwrap() {
            return Err(LaunchError::BrowserNotFound);
        }
        Ok(LaunchedBrowser {
            port: request.port.unwrap_or(9222),
            url: request.url.clone(),
            pid: Some(4242),
        })
    }

    async fn terminate(&self) {
        *self.terminated.lock().unwrap() += 1;
    }
}

/// Let spawned tasks run until `cond` holds (bounded).
pub async fn settle(mut cond: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if cond() {
            return;
        }
        tokio::task::yield_now().await;
    }
}
