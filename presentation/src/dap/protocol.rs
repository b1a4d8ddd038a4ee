//! Debug Adapter Protocol message types.
//!
//! Only the requests and events the adapter actually handles are modelled.
//! Argument structs accept the camelCase names DAP clients send.

use browser_dap_application::LaunchRequest;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A client request.
#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    pub seq: i64,
    pub command: String,
    #[serde(default)]
    pub arguments: Value,
}

impl Request {
    /// Decode the request arguments.
    ///
    /// A request without arguments decodes like an empty object, so argument
    /// structs made only of optional fields still parse.
    pub fn arguments<T: for<'de> Deserialize<'de>>(&self) -> Result<T, serde_json::Error> {
        match &self.arguments {
            Value::Null => serde_json::from_value(Value::Object(Default::default())),
            args => serde_json::from_value(args.clone()),
        }
    }
}

/// Response to a client request.
#[derive(Debug, Clone, Serialize)]
pub struct Response {
    pub seq: i64,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub request_seq: i64,
    pub success: bool,
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

/// Event pushed to the client.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub seq: i64,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeArguments {
    #[serde(default, rename = "adapterID")]
    pub adapter_id: Option<String>,
    #[serde(default = "default_true")]
    pub lines_start_at1: bool,
    #[serde(default = "default_true")]
    pub columns_start_at1: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub supports_configuration_done_request: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachArguments {
    pub port: u16,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchArguments {
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub runtime_args: Vec<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub browser_path: Option<String>,
}

impl From<LaunchArguments> for LaunchRequest {
    fn from(args: LaunchArguments) -> Self {
        LaunchRequest {
            file: args.file,
            url: args.url,
            runtime_args: args.runtime_args,
            port: args.port,
            browser_path: args.browser_path,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Source {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceBreakpoint {
    pub line: i64,
    #[serde(default)]
    pub column: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetBreakpointsArguments {
    pub source: Source,
    #[serde(default)]
    pub breakpoints: Option<Vec<SourceBreakpoint>>,
    /// Legacy form: parallel `lines` / `cols` arrays.
    #[serde(default)]
    pub lines: Option<Vec<i64>>,
    #[serde(default)]
    pub cols: Option<Vec<i64>>,
}

impl SetBreakpointsArguments {
    /// Requested `(line, column)` pairs in client coordinates, request order.
    ///
    /// `breakpoints` wins over the legacy arrays when both are present.
    pub fn requested(&self) -> Vec<(i64, Option<i64>)> {
        if let Some(breakpoints) = &self.breakpoints {
            return breakpoints.iter().map(|bp| (bp.line, bp.column)).collect();
        }
        let cols = self.cols.as_deref().unwrap_or_default();
        self.lines
            .as_deref()
            .unwrap_or_default()
            .iter()
            .enumerate()
            .map(|(i, line)| (*line, cols.get(i).copied()))
            .collect()
    }
}

/// One entry of a `setBreakpoints` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breakpoint {
    pub line: i64,
    pub column: i64,
    pub verified: bool,
}
