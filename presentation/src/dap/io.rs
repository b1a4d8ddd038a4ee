//! Content-Length framing for DAP messages.
//!
//! Every message is a header block terminated by an empty line, followed by
//! exactly `Content-Length` bytes of UTF-8 JSON:
//!
//! ```text
//! Content-Length: 42\r\n
//! \r\n
//! {"seq":1,"type":"request","command":"threads"}
//! ```

use serde_json::Value;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest body accepted from a client.
const MAX_CONTENT_LENGTH: usize = 16 * 1024 * 1024;

/// Framing failures. All of them end the client session.
#[derive(Error, Debug)]
pub enum FramingError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing Content-Length header")]
    MissingContentLength,

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Invalid message body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Stream ended inside a message")]
    UnexpectedEof,
}

/// Read one message.
///
/// Returns `Ok(None)` on a clean end of stream between messages.
pub async fn read_message<R>(reader: &mut R) -> Result<Option<Value>, FramingError>
where
    R: AsyncBufRead + Unpin,
{
    let mut content_length = None;
    let mut seen_header = false;
    let mut line = String::new();

    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            if seen_header {
                return Err(FramingError::UnexpectedEof);
            }
            return Ok(None);
        }
        let header = line.trim_end_matches(['\r', '\n']);
        if header.is_empty() {
            if seen_header {
                break;
            }
            // Stray blank line between messages.
            continue;
        }
        seen_header = true;

        let (name, value) = header
            .split_once(':')
            .ok_or_else(|| FramingError::InvalidHeader(header.to_string()))?;
        if name.trim().eq_ignore_ascii_case("content-length") {
            let length = value
                .trim()
                .parse::<usize>()
                .map_err(|_| FramingError::InvalidHeader(header.to_string()))?;
            if length > MAX_CONTENT_LENGTH {
                return Err(FramingError::InvalidHeader(header.to_string()));
            }
            content_length = Some(length);
        }
    }

    let length = content_length.ok_or(FramingError::MissingContentLength)?;
    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            FramingError::UnexpectedEof
        } else {
            FramingError::Io(e)
        }
    })?;
    Ok(Some(serde_json::from_slice(&body)?))
}

/// Write one message and flush.
pub async fn write_message<W>(writer: &mut W, message: &Value) -> Result<(), FramingError>
where
    W: AsyncWrite + Unpin,
{
    let body = serde_json::to_vec(message)?;
    let header = format!("Content-Length: {}\r\n\r\n", body.len());
    writer.write_all(header.as_bytes()).await?;
    writer.write_all(&body).await?;
    writer.flush().await?;
    Ok(())
}
