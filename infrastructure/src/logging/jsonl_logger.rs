//! JSONL file writer for protocol traffic.
//!
//! Each [`TraceEvent`] becomes one JSON line carrying `type` (the protocol),
//! `direction`, `timestamp` and the message itself.

use browser_dap_application::{ProtocolTraceLogger, TraceEvent};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// Protocol trace sink shared by the CDP router and the DAP server.
///
/// Lines are buffered and flushed when the logger is dropped.
pub struct JsonlTraceLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlTraceLogger {
    /// Open (truncating) the trace file, creating missing directories.
    ///
    /// Failure is logged and yields `None`; tracing is then simply off.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create trace directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match File::create(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not create trace file {}: {}", path.display(), e);
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProtocolTraceLogger for JsonlTraceLogger {
    fn log(&self, event: TraceEvent) {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        let record = serde_json::json!({
            "type": event.channel,
            "direction": event.direction.as_str(),
            "timestamp": timestamp,
            "message": event.payload,
        });

        let Ok(line) = serde_json::to_string(&record) else {
            return;
        };

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
            let _ = writer.flush();
        }
    }
}

impl Drop for JsonlTraceLogger {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}
