//! CDP wire types.
//!
//! - **Commands**: adapter → browser, `{id, method, params}`
//! - **Responses**: browser → adapter, `{id, result | error}`
//! - **Events**: browser → adapter, `{method, params}` with no `id`
//!
//! [`decode_event`] maps the events the session cares about onto the closed
//! [`CdpEvent`] union; everything else is dropped.

use browser_dap_domain::{BreakpointId, CdpEvent, ConsoleMessage, Position, ResolvedLocation};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global command id counter.
static COMMAND_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    COMMAND_ID.fetch_add(1, Ordering::SeqCst)
}

/// A command sent to the browser.
#[derive(Debug, Clone, Serialize)]
pub struct CdpRequest {
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl CdpRequest {
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            id: next_id(),
            method: method.into(),
            params,
        }
    }
}

/// The browser's answer to a command.
#[derive(Debug, Clone, Deserialize)]
pub struct CdpResponse {
    pub id: u64,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<CdpErrorObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CdpErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

/// An unsolicited message from the browser.
#[derive(Debug, Clone, Deserialize)]
pub struct CdpNotification {
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

/// `Debugger.Location`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CdpLocation {
    pub script_id: String,
    pub line_number: u32,
    #[serde(default)]
    pub column_number: Option<u32>,
}

impl From<CdpLocation> for ResolvedLocation {
    fn from(loc: CdpLocation) -> Self {
        ResolvedLocation::new(loc.script_id, loc.line_number, loc.column_number.unwrap_or(0))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetBreakpointByUrlParams {
    pub url: String,
    pub line_number: u32,
    pub column_number: u32,
}

impl SetBreakpointByUrlParams {
    pub fn new(url: &str, position: Position) -> Self {
        Self {
            url: url.to_string(),
            line_number: position.line,
            column_number: position.column,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetBreakpointByUrlResult {
    pub breakpoint_id: String,
    #[serde(default)]
    pub locations: Vec<CdpLocation>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveBreakpointParams {
    pub breakpoint_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScriptParsedParams {
    script_id: String,
    #[serde(default)]
    url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BreakpointResolvedParams {
    breakpoint_id: String,
    location: CdpLocation,
}

#[derive(Debug, Deserialize)]
struct MessageAddedParams {
    message: ConsoleMessage,
}

/// `Runtime.RemoteObject`, reduced to what console formatting needs.
#[derive(Debug, Deserialize)]
struct RemoteObject {
    #[serde(default)]
    value: Option<Value>,
    #[serde(default)]
    description: Option<String>,
}

impl RemoteObject {
    fn render(&self) -> String {
        match (&self.value, &self.description) {
            (Some(Value::String(s)), _) => s.clone(),
            (Some(v), _) => v.to_string(),
            (None, Some(d)) => d.clone(),
            (None, None) => "undefined".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConsoleApiCalledParams {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    args: Vec<RemoteObject>,
}

#[derive(Debug, Deserialize)]
struct DetachedParams {
    #[serde(default)]
    reason: Option<String>,
}

/// Decode a browser event into the session's event union.
///
/// Returns `None` for events the session ignores and for payloads that
/// do not match the expected shape.
pub fn decode_event(method: &str, params: Option<Value>) -> Option<CdpEvent> {
    let params = params.unwrap_or(Value::Null);
    match method {
        "Runtime.executionContextsCleared" => Some(CdpEvent::ContextCleared),
        "Debugger.scriptParsed" => {
            let p: ScriptParsedParams = serde_json::from_value(params).ok()?;
            Some(CdpEvent::ScriptParsed {
                script_id: p.script_id.into(),
                url: p.url,
            })
        }
        "Debugger.breakpointResolved" => {
            let p: BreakpointResolvedParams = serde_json::from_value(params).ok()?;
            Some(CdpEvent::BreakpointResolved {
                breakpoint_id: BreakpointId::new(p.breakpoint_id),
                location: p.location.into(),
            })
        }
        "Console.messageAdded" => {
            let p: MessageAddedParams = serde_json::from_value(params).ok()?;
            Some(CdpEvent::ConsoleMessage(p.message))
        }
        "Runtime.consoleAPICalled" => {
            let p: ConsoleApiCalledParams = serde_json::from_value(params).ok()?;
            let text = p
                .args
                .iter()
                .map(RemoteObject::render)
                .collect::<Vec<_>>()
                .join(" ");
            Some(CdpEvent::ConsoleMessage(
                ConsoleMessage::new(text).with_level(p.kind),
            ))
        }
        "Inspector.detached" => {
            let p: DetachedParams = serde_json::from_value(params).unwrap_or(DetachedParams {
                reason: None,
            });
            Some(CdpEvent::ConnectionLost {
                reason: p.reason.unwrap_or_else(|| "inspector detached".into()),
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use browser_dap_domain::ScriptId;
    use serde_json::json;

    #[test]
    fn test_request_ids_increase() {
        let a = CdpRequest::new("Runtime.enable", None);
        let b = CdpRequest::new("Debugger.enable", None);
        assert!(b.id > a.id);
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["method"], "Runtime.enable");
        assert!(json.get("params").is_none());
    }

    #[test]
    fn test_set_breakpoint_params_use_camel_case() {
        let params = SetBreakpointByUrlParams::new("file:///a.js", Position::new(5, 6));
        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({"url": "file:///a.js", "lineNumber": 5, "columnNumber": 6})
        );
    }

    #[test]
    fn test_set_breakpoint_result_with_immediate_location() {
        let result: SetBreakpointByUrlResult = serde_json::from_value(json!({
            "breakpointId": "bpId0",
            "locations": [{"scriptId": "S", "lineNumber": 5, "columnNumber": 6}]
        }))
        .unwrap();
        assert_eq!(result.breakpoint_id, "bpId0");
        let loc: ResolvedLocation = result.locations[0].clone().into();
        assert_eq!(loc, ResolvedLocation::new("S", 5, 6));
    }

    #[test]
    fn test_decodes_script_parsed() {
        let event = decode_event(
            "Debugger.scriptParsed",
            Some(json!({"scriptId": "42", "url": "file:///a.js", "startLine": 0})),
        );
        assert_eq!(
            event,
            Some(CdpEvent::ScriptParsed {
                script_id: ScriptId::from("42"),
                url: "file:///a.js".into()
            })
        );
    }

    #[test]
    fn test_decodes_breakpoint_resolved_without_column() {
        let event = decode_event(
            "Debugger.breakpointResolved",
            Some(json!({
                "breakpointId": "bpId1",
                "location": {"scriptId": "S", "lineNumber": 3}
            })),
        );
        assert_eq!(
            event,
            Some(CdpEvent::BreakpointResolved {
                breakpoint_id: BreakpointId::from("bpId1"),
                location: ResolvedLocation::new("S", 3, 0),
            })
        );
    }

    #[test]
    fn test_decodes_console_message_added() {
        let event = decode_event(
            "Console.messageAdded",
            Some(json!({"message": {
                "source": "console-api", "level": "log", "text": "Hello, world!",
                "url": "file:///a.js", "line": 1, "column": 9
            }})),
        );
        let Some(CdpEvent::ConsoleMessage(msg)) = event else {
            panic!("expected console message");
        };
        assert_eq!(msg.text, "Hello, world!");
        assert_eq!(msg.level.as_deref(), Some("log"));
        assert_eq!(msg.line, Some(1));
    }

    #[test]
    fn test_console_api_call_joins_arguments() {
        let event = decode_event(
            "Runtime.consoleAPICalled",
            Some(json!({
                "type": "error",
                "args": [
                    {"type": "string", "value": "count"},
                    {"type": "number", "value": 3},
                    {"type": "object", "description": "Array(2)"}
                ],
                "executionContextId": 1
            })),
        );
        let Some(CdpEvent::ConsoleMessage(msg)) = event else {
            panic!("expected console message");
        };
        assert_eq!(msg.text, "count 3 Array(2)");
        assert!(msg.is_error());
    }

    #[test]
    fn test_inspector_detached_is_connection_lost() {
        let event = decode_event(
            "Inspector.detached",
            Some(json!({"reason": "target_closed"})),
        );
        assert_eq!(
            event,
            Some(CdpEvent::ConnectionLost {
                reason: "target_closed".into()
            })
        );
    }

    #[test]
    fn test_unknown_and_malformed_events_are_dropped() {
        assert_eq!(decode_event("Page.loadEventFired", None), None);
        assert_eq!(
            decode_event("Debugger.scriptParsed", Some(json!({"url": 1}))),
            None
        );
        assert_eq!(
            decode_event("Runtime.executionContextsCleared", None),
            Some(CdpEvent::ContextCleared)
        );
    }
}
