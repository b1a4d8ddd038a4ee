//! Error types for the CDP adapter

use browser_dap_application::TransportError;
use thiserror::Error;

/// Result type alias for CDP operations
pub type Result<T> = std::result::Result<T, CdpError>;

/// Errors that can occur when talking to the browser's debugging endpoint
#[derive(Error, Debug)]
pub enum CdpError {
    #[error("Target discovery failed: {0}")]
    Discovery(String),

    #[error("No debuggable page found on port {port}")]
    NoTarget { port: u16 },

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{method} failed (code {code}): {message}")]
    Protocol {
        method: String,
        code: i64,
        message: String,
    },

    #[error("Unexpected response to {method}: {detail}")]
    UnexpectedResponse { method: String, detail: String },

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Timed out waiting for {0}")]
    Timeout(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for CdpError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        CdpError::WebSocket(e.to_string())
    }
}

impl From<CdpError> for TransportError {
    fn from(e: CdpError) -> Self {
        match e {
            CdpError::ConnectionClosed => TransportError::ConnectionLost("connection closed".into()),
            CdpError::Timeout(what) => TransportError::Timeout(what),
            CdpError::Protocol {
                method, message, ..
            } => TransportError::Call { method, message },
            CdpError::UnexpectedResponse { method, detail } => TransportError::Call {
                method,
                message: detail,
            },
            CdpError::Discovery(_) | CdpError::NoTarget { .. } | CdpError::WebSocket(_) => {
                TransportError::Connect(e.to_string())
            }
            CdpError::Serialization(e) => TransportError::Call {
                method: "serialize".into(),
                message: e.to_string(),
            },
        }
    }
}
