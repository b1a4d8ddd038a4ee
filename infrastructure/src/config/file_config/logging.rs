//! Log destination configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Diagnostic log file; stderr when unset
    pub file: Option<PathBuf>,
    /// JSONL protocol trace; disabled when unset
    pub trace_file: Option<PathBuf>,
}
