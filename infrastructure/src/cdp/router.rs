//! WebSocket demultiplexer for one CDP connection.
//!
//! A single background reader task owns the read half of the socket. Each
//! frame is classified with [`classify_message`]:
//!
//! - **Response** → the pending `oneshot` registered under its `id`
//! - **Event** → decoded with [`decode_event`] and pushed, in arrival order,
//!   onto the session's event channel
//!
//! When the socket closes the reader drops every pending sender (callers see
//! [`CdpError::ConnectionClosed`]) and pushes one
//! [`CdpEvent::ConnectionLost`].

use crate::cdp::error::{CdpError, Result};
use crate::cdp::protocol::{CdpNotification, CdpRequest, CdpResponse, decode_event};
use crate::cdp::transport::{MessageKind, classify_message};
use browser_dap_application::{Direction, ProtocolTraceLogger, TraceEvent};
use browser_dap_domain::CdpEvent;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, trace, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Pending command senders; `None` once the reader has stopped.
type Pending = Arc<std::sync::Mutex<Option<HashMap<u64, oneshot::Sender<CdpResponse>>>>>;

/// One connection to a page's debugging endpoint.
pub struct CdpRouter {
    writer: Mutex<SplitSink<WsStream, Message>>,
    pending: Pending,
    request_timeout: Duration,
    trace: Arc<dyn ProtocolTraceLogger>,
    reader_handle: JoinHandle<()>,
}

impl CdpRouter {
    /// Connect to `ws_url` and start the reader task.
    ///
    /// Returns the router and the receiving end of the connection's event
    /// channel.
    pub async fn connect(
        ws_url: &str,
        connect_timeout: Duration,
        request_timeout: Duration,
        trace: Arc<dyn ProtocolTraceLogger>,
    ) -> Result<(Arc<Self>, mpsc::UnboundedReceiver<CdpEvent>)> {
        debug!("Connecting to {}", ws_url);
        let (socket, _response) = tokio::time::timeout(connect_timeout, connect_async(ws_url))
            .await
            .map_err(|_| CdpError::Timeout(format!("WebSocket connect to {}", ws_url)))??;
        info!("Connected to {}", ws_url);

        let (sink, stream) = socket.split();
        let pending: Pending = Arc::new(std::sync::Mutex::new(Some(HashMap::new())));
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let pending_bg = Arc::clone(&pending);
        let trace_bg = Arc::clone(&trace);
        let reader_handle = tokio::spawn(async move {
            Self::reader_loop(stream, pending_bg, events_tx, trace_bg).await;
        });

        let router = Arc::new(Self {
            writer: Mutex::new(sink),
            pending,
            request_timeout,
            trace,
            reader_handle,
        });
        Ok((router, events_rx))
    }

    /// Background reader loop, sole owner of the read half.
    async fn reader_loop(
        mut stream: SplitStream<WsStream>,
        pending: Pending,
        events: mpsc::UnboundedSender<CdpEvent>,
        trace: Arc<dyn ProtocolTraceLogger>,
    ) {
        let reason = loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    Self::handle_frame(&text, &pending, &events, trace.as_ref());
                }
                Some(Ok(Message::Close(frame))) => {
                    break frame
                        .map(|f| format!("closed by browser: {}", f.reason))
                        .unwrap_or_else(|| "closed by browser".into());
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("CDP reader: socket error: {}", e);
                    break e.to_string();
                }
                None => break "socket closed".into(),
            };
        };

        info!("CDP reader stopped: {}", reason);
        // Dropping the senders fails every waiting caller
        pending.lock().unwrap_or_else(|e| e.into_inner()).take();
        let _ = events.send(CdpEvent::ConnectionLost { reason });
    }

    fn handle_frame(
        text: &str,
        pending: &Pending,
        events: &mpsc::UnboundedSender<CdpEvent>,
        trace: &dyn ProtocolTraceLogger,
    ) {
        trace!("CDP received: {}", text);
        let json: Value = match serde_json::from_str(text) {
            Ok(v) => v,
            Err(e) => {
                warn!("CDP reader: invalid JSON: {}", e);
                return;
            }
        };
        trace.log(TraceEvent::new("cdp", Direction::Incoming, json.clone()));

        match classify_message(&json) {
            MessageKind::Response { id } => {
                let response: CdpResponse = match serde_json::from_value(json) {
                    Ok(r) => r,
                    Err(e) => {
                        warn!("CDP reader: malformed response {}: {}", id, e);
                        return;
                    }
                };
                let sender = pending
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .as_mut()
                    .and_then(|p| p.remove(&id));
                match sender {
                    Some(tx) => {
                        let _ = tx.send(response);
                    }
                    None => debug!("CDP reader: no pending command for id={}", id),
                }
            }
            MessageKind::Event => {
                let Ok(notification) = serde_json::from_value::<CdpNotification>(json) else {
                    return;
                };
                match decode_event(&notification.method, notification.params) {
                    Some(event) => {
                        let _ = events.send(event);
                    }
                    None => trace!("CDP reader: ignoring {}", notification.method),
                }
            }
            MessageKind::Unknown => debug!("CDP reader: unclassifiable message"),
        }
    }

    /// Send a command and wait for its result, bounded by the request timeout.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let request = CdpRequest::new(method, params);
        let id = request.id;
        let (tx, rx) = oneshot::channel();

        {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            match pending.as_mut() {
                Some(p) => {
                    p.insert(id, tx);
                }
                None => return Err(CdpError::ConnectionClosed),
            }
        }

        if let Err(e) = self.send(&request).await {
            self.forget(id);
            return Err(e);
        }

        let response = match tokio::time::timeout(self.request_timeout, rx).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => return Err(CdpError::ConnectionClosed),
            Err(_) => {
                self.forget(id);
                warn!("{} (id={}) timed out", method, id);
                return Err(CdpError::Timeout(method.to_string()));
            }
        };

        match (response.result, response.error) {
            (_, Some(error)) => Err(CdpError::Protocol {
                method: method.to_string(),
                code: error.code,
                message: error.message,
            }),
            (Some(result), None) => Ok(result),
            (None, None) => Ok(Value::Null),
        }
    }

    async fn send(&self, request: &CdpRequest) -> Result<()> {
        let json = serde_json::to_value(request)?;
        let text = json.to_string();
        trace!("CDP sending: {}", text);
        self.trace
            .log(TraceEvent::new("cdp", Direction::Outgoing, json));

        let mut writer = self.writer.lock().await;
        writer.send(Message::Text(text)).await.map_err(|e| {
            debug!("CDP send failed: {}", e);
            CdpError::ConnectionClosed
        })
    }

    fn forget(&self, id: u64) {
        if let Some(p) = self.pending.lock().unwrap_or_else(|e| e.into_inner()).as_mut() {
            p.remove(&id);
        }
    }

    /// Close the socket. The reader task observes the close and stops.
    pub async fn close(&self) {
        let mut writer = self.writer.lock().await;
        let _ = writer.send(Message::Close(None)).await;
        let _ = writer.close().await;
    }
}

impl Drop for CdpRouter {
    fn drop(&mut self) {
        self.reader_handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use browser_dap_application::NoProtocolTrace;
    use browser_dap_domain::ScriptId;
    use serde_json::json;
    use tokio::net::TcpListener;

    /// Start a one-connection WebSocket server driven by `script`.
    async fn serve<F, Fut>(script: F) -> String
    where
        F: FnOnce(WebSocketStream<TcpStream>) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ()> + Send,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            script(ws).await;
        });
        format!("ws://{}/devtools/page/1", addr)
    }

    async fn next_request(ws: &mut WebSocketStream<TcpStream>) -> Value {
        let msg = ws.next().await.unwrap().unwrap();
        serde_json::from_str(msg.to_text().unwrap()).unwrap()
    }

    async fn connect(
        url: &str,
        request_timeout: Duration,
    ) -> (Arc<CdpRouter>, mpsc::UnboundedReceiver<CdpEvent>) {
        CdpRouter::connect(
            url,
            Duration::from_secs(5),
            request_timeout,
            Arc::new(NoProtocolTrace),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_call_is_correlated_and_events_are_forwarded() {
        let url = serve(|mut ws| async move {
            let req = next_request(&mut ws).await;
            assert_eq!(req["method"], "Debugger.setBreakpointByUrl");
            let event = json!({
                "method": "Debugger.scriptParsed",
                "params": {"scriptId": "S", "url": "file:///a.js"}
            });
            ws.send(Message::Text(event.to_string())).await.unwrap();
            let response = json!({"id": req["id"], "result": {"breakpointId": "bpId0", "locations": []}});
            ws.send(Message::Text(response.to_string())).await.unwrap();
            let _ = ws.next().await;
        })
        .await;
        let (router, mut events) = connect(&url, Duration::from_secs(5)).await;

        let result = router
            .call(
                "Debugger.setBreakpointByUrl",
                Some(json!({"url": "file:///a.js", "lineNumber": 0, "columnNumber": 0})),
            )
            .await
            .unwrap();

        assert_eq!(result["breakpointId"], "bpId0");
        assert_eq!(
            events.recv().await,
            Some(CdpEvent::ScriptParsed {
                script_id: ScriptId::from("S"),
                url: "file:///a.js".into()
            })
        );
    }

    #[tokio::test]
    async fn test_error_response_becomes_protocol_error() {
        let url = serve(|mut ws| async move {
            let req = next_request(&mut ws).await;
            let response = json!({"id": req["id"], "error": {"code": -32000, "message": "Breakpoint not found"}});
            ws.send(Message::Text(response.to_string())).await.unwrap();
            let _ = ws.next().await;
        })
        .await;
        let (router, _events) = connect(&url, Duration::from_secs(5)).await;

        let err = router
            .call("Debugger.removeBreakpoint", Some(json!({"breakpointId": "x"})))
            .await
            .unwrap_err();

        assert!(matches!(err, CdpError::Protocol { code: -32000, .. }));
    }

    #[tokio::test]
    async fn test_closed_socket_fails_pending_call_and_reports_loss() {
        let url = serve(|mut ws| async move {
            let _ = next_request(&mut ws).await;
            let _ = ws.close(None).await;
        })
        .await;
        let (router, mut events) = connect(&url, Duration::from_secs(5)).await;

        let err = router.call("Runtime.enable", None).await.unwrap_err();

        assert!(matches!(err, CdpError::ConnectionClosed));
        assert!(matches!(
            events.recv().await,
            Some(CdpEvent::ConnectionLost { .. })
        ));
        assert!(matches!(
            router.call("Runtime.enable", None).await,
            Err(CdpError::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn test_silent_browser_times_out() {
        let url = serve(|mut ws| async move {
            let _ = next_request(&mut ws).await;
            let _ = ws.next().await;
        })
        .await;
        let (router, _events) = connect(&url, Duration::from_millis(50)).await;

        let err = router.call("Debugger.enable", None).await.unwrap_err();

        assert!(matches!(err, CdpError::Timeout(method) if method == "Debugger.enable"));
    }
}
