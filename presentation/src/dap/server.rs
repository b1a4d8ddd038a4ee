//! DAP server
//!
//! Serves one IDE client over any byte stream. Requests are read in order
//! and answered through a shared writer. `setBreakpoints` requests go to a
//! queue per source path, drained in arrival order by one task each, so
//! different sources reconcile concurrently while one source never sees
//! its requests reordered. IDE events from the session controller are
//! written by a forwarder task through the same writer.

use crate::dap::io::{FramingError, read_message, write_message};
use crate::dap::protocol::{
    AttachArguments, Breakpoint, Capabilities, Event, InitializeArguments, LaunchArguments,
    Request, Response, SetBreakpointsArguments,
};
use browser_dap_application::{
    AttachTarget, Direction, NoProtocolTrace, ProtocolTraceLogger, SessionController, TraceEvent,
};
use browser_dap_domain::{IdeEvent, OutputEvent, Position};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};
use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// The only thread the adapter reports.
const THREAD_ID: i64 = 1;

/// DAP front end for one [`SessionController`].
pub struct DapServer {
    controller: Arc<SessionController>,
    trace: Arc<dyn ProtocolTraceLogger>,
}

impl DapServer {
    pub fn new(controller: Arc<SessionController>) -> Self {
        Self {
            controller,
            trace: Arc::new(NoProtocolTrace),
        }
    }

    /// Record every DAP message in both directions.
    pub fn with_trace(mut self, trace: Arc<dyn ProtocolTraceLogger>) -> Self {
        self.trace = trace;
        self
    }

    /// Serve requests until the client disconnects or the stream ends.
    ///
    /// `events` is the receiver returned alongside the controller. The
    /// browser is released before this returns.
    pub async fn serve<R, W>(
        self,
        reader: R,
        writer: W,
        events: mpsc::UnboundedReceiver<IdeEvent>,
    ) -> Result<(), FramingError>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let session = Arc::new(ClientSession {
            controller: self.controller,
            bases: ClientBases::default(),
            out: Outbound::new(writer, self.trace.clone()),
        });
        let forwarder = tokio::spawn(forward_events(session.clone(), events));

        let mut reader = BufReader::new(reader);
        let mut in_flight = JoinSet::new();
        let mut queues: HashMap<String, mpsc::UnboundedSender<Request>> = HashMap::new();
        let mut disconnected = false;

        let result = loop {
            let message = match read_message(&mut reader).await {
                Ok(Some(message)) => message,
                Ok(None) => {
                    info!("DAP client closed the stream");
                    break Ok(());
                }
                Err(e) => break Err(e),
            };
            self.trace
                .log(TraceEvent::new("dap", Direction::Incoming, message.clone()));

            let request: Request = match serde_json::from_value(message) {
                Ok(request) => request,
                Err(e) => {
                    warn!("Ignoring malformed DAP message: {}", e);
                    continue;
                }
            };
            debug!("DAP request {} #{}", request.command, request.seq);

            match request.command.as_str() {
                "setBreakpoints" => {
                    let queue = queues.entry(source_key(&request)).or_insert_with(|| {
                        let (tx, rx) = mpsc::unbounded_channel();
                        in_flight.spawn(drain_source_queue(session.clone(), rx));
                        tx
                    });
                    if let Err(mpsc::error::SendError(request)) = queue.send(request) {
                        let result = Err("breakpoint queue closed".to_string());
                        session.out.respond(&request, result).await;
                    }
                }
                "disconnect" => {
                    let result = session.handle(&request).await;
                    session.out.respond(&request, result).await;
                    disconnected = true;
                    break Ok(());
                }
                _ => {
                    let result = session.handle(&request).await;
                    session.out.respond(&request, result).await;
                }
            }
        };

        // Closing the queues lets each drain task finish its backlog and exit.
        drop(queues);
        while in_flight.join_next().await.is_some() {}
        if !disconnected {
            session.controller.disconnect().await;
        }
        forwarder.abort();
        result
    }
}

/// First line and column number in the client's coordinates.
struct ClientBases {
    line: AtomicU32,
    column: AtomicU32,
}

impl Default for ClientBases {
    fn default() -> Self {
        Self {
            line: AtomicU32::new(1),
            column: AtomicU32::new(1),
        }
    }
}

impl ClientBases {
    fn set(&self, lines_start_at1: bool, columns_start_at1: bool) {
        self.line
            .store(u32::from(lines_start_at1), Ordering::Relaxed);
        self.column
            .store(u32::from(columns_start_at1), Ordering::Relaxed);
    }

    fn get(&self) -> (u32, u32) {
        (
            self.line.load(Ordering::Relaxed),
            self.column.load(Ordering::Relaxed),
        )
    }
}

/// Serialised writer with the outgoing sequence counter.
struct Outbound<W> {
    writer: Mutex<W>,
    seq: AtomicI64,
    trace: Arc<dyn ProtocolTraceLogger>,
}

impl<W: AsyncWrite + Unpin> Outbound<W> {
    fn new(writer: W, trace: Arc<dyn ProtocolTraceLogger>) -> Self {
        Self {
            writer: Mutex::new(writer),
            seq: AtomicI64::new(1),
            trace,
        }
    }

    async fn send<F>(&self, build: F) -> Result<(), FramingError>
    where
        F: FnOnce(i64) -> Result<Value, serde_json::Error>,
    {
        let mut writer = self.writer.lock().await;
        // Allocated under the lock so sequence numbers go out in order.
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let message = build(seq)?;
        self.trace
            .log(TraceEvent::new("dap", Direction::Outgoing, message.clone()));
        write_message(&mut *writer, &message).await
    }

    async fn respond(&self, request: &Request, result: Result<Option<Value>, String>) {
        let (success, message, body) = match result {
            Ok(body) => (true, None, body),
            Err(message) => {
                debug!("DAP request {} failed: {}", request.command, message);
                (false, Some(message), None)
            }
        };
        let sent = self
            .send(|seq| {
                serde_json::to_value(Response {
                    seq,
                    kind: "response",
                    request_seq: request.seq,
                    success,
                    command: request.command.clone(),
                    message,
                    body,
                })
            })
            .await;
        if let Err(e) = sent {
            warn!("Failed to send {} response: {}", request.command, e);
        }
    }

    async fn event(&self, event: &str, body: Option<Value>) -> Result<(), FramingError> {
        self.send(|seq| {
            serde_json::to_value(Event {
                seq,
                kind: "event",
                event: event.to_string(),
                body,
            })
        })
        .await
    }
}

struct ClientSession<W> {
    controller: Arc<SessionController>,
    bases: ClientBases,
    out: Outbound<W>,
}

impl<W: AsyncWrite + Unpin + Send> ClientSession<W> {
    async fn handle(&self, request: &Request) -> Result<Option<Value>, String> {
        match request.command.as_str() {
            "initialize" => {
                let args: InitializeArguments = request.arguments().map_err(invalid)?;
                self.bases.set(args.lines_start_at1, args.columns_start_at1);
                info!(
                    "DAP client initialized (adapter id {:?})",
                    args.adapter_id.as_deref().unwrap_or("-")
                );
                let capabilities = Capabilities {
                    supports_configuration_done_request: true,
                };
                Ok(Some(serde_json::to_value(capabilities).map_err(invalid)?))
            }
            "attach" => {
                let args: AttachArguments = request.arguments().map_err(invalid)?;
                let mut target = AttachTarget::new(args.port);
                if let Some(url) = args.url {
                    target = target.with_url(url);
                }
                self.controller
                    .attach(target)
                    .await
                    .map_err(|e| e.to_string())?;
                Ok(None)
            }
            "launch" => {
                let args: LaunchArguments = request.arguments().map_err(invalid)?;
                self.controller
                    .launch(args.into())
                    .await
                    .map_err(|e| e.to_string())?;
                Ok(None)
            }
            "setBreakpoints" => self.set_breakpoints(request).await,
            "configurationDone" => Ok(None),
            "threads" => Ok(Some(json!({
                "threads": [{"id": THREAD_ID, "name": "Main Thread"}]
            }))),
            "disconnect" => {
                self.controller.disconnect().await;
                Ok(None)
            }
            _ => Err("unsupported command".to_string()),
        }
    }

    async fn set_breakpoints(&self, request: &Request) -> Result<Option<Value>, String> {
        let args: SetBreakpointsArguments = request.arguments().map_err(invalid)?;
        let path = args
            .source
            .path
            .as_deref()
            .ok_or_else(|| "setBreakpoints requires source.path".to_string())?;

        let (line_base, column_base) = self.bases.get();
        let positions = args
            .requested()
            .into_iter()
            .map(|(line, column)| Position::from_client(line, column, line_base, column_base))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| e.to_string())?;

        let statuses = self
            .controller
            .set_breakpoints(path, &positions)
            .await
            .map_err(|e| e.to_string())?;

        let breakpoints: Vec<Breakpoint> = statuses
            .iter()
            .map(|status| {
                let (line, column) = status.position.to_client(line_base, column_base);
                Breakpoint {
                    line,
                    column,
                    verified: status.verified,
                }
            })
            .collect();
        Ok(Some(json!({ "breakpoints": breakpoints })))
    }
}

fn invalid(e: serde_json::Error) -> String {
    format!("invalid arguments: {}", e)
}

fn output_body(output: &OutputEvent) -> Value {
    let mut body = json!({
        "category": output.category.as_str(),
        "output": output.text,
        "text": output.text,
    });
    if let Some(url) = &output.url {
        body["source"] = json!({ "path": url });
    }
    if let Some(line) = output.line {
        body["line"] = json!(line);
    }
    if let Some(column) = output.column {
        body["column"] = json!(column);
    }
    body
}

/// Queue key for a `setBreakpoints` request: the raw source path.
fn source_key(request: &Request) -> String {
    request
        .arguments
        .get("source")
        .and_then(|source| source.get("path"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Answer one source's `setBreakpoints` requests in arrival order.
async fn drain_source_queue<W>(
    session: Arc<ClientSession<W>>,
    mut requests: mpsc::UnboundedReceiver<Request>,
) where
    W: AsyncWrite + Unpin + Send,
{
    while let Some(request) = requests.recv().await {
        let result = session.handle(&request).await;
        session.out.respond(&request, result).await;
    }
}

async fn forward_events<W>(
    session: Arc<ClientSession<W>>,
    mut events: mpsc::UnboundedReceiver<IdeEvent>,
) where
    W: AsyncWrite + Unpin + Send,
{
    while let Some(event) = events.recv().await {
        let body = match &event {
            IdeEvent::Output(output) => Some(output_body(output)),
            IdeEvent::Initialized | IdeEvent::Terminated => None,
        };
        if let Err(e) = session.out.event(event.name(), body).await {
            warn!("Stopped forwarding IDE events: {}", e);
            break;
        }
    }
}
