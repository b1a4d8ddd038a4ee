//! File system path to script URL resolution.

use browser_dap_application::PathResolver;
use reqwest::Url;
use std::path::{Path, PathBuf};

/// Maps IDE source paths to the URLs the browser reports for scripts.
pub struct FileUrlPathResolver {
    base: PathBuf,
}

impl FileUrlPathResolver {
    /// Resolve relative paths against the process working directory.
    pub fn new() -> Self {
        let base = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
        Self { base }
    }

    pub fn with_base(base: impl AsRef<Path>) -> Self {
        Self {
            base: base.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileUrlPathResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// `scheme://...` with an alphabetic scheme.
fn has_scheme(s: &str) -> bool {
    s.split_once("://").is_some_and(|(scheme, _)| {
        scheme.len() > 1
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

/// `C:/...`
fn is_drive_path(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() >= 3 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && bytes[2] == b'/'
}

impl PathResolver for FileUrlPathResolver {
    fn to_url(&self, path: &str) -> String {
        if has_scheme(path) {
            return path.to_string();
        }

        let normalized = path.replace('\\', "/");
        if is_drive_path(&normalized) {
            return format!("file:///{}", normalized);
        }

        let absolute = if normalized.starts_with('/') {
            PathBuf::from(&normalized)
        } else {
            self.base.join(&normalized)
        };
        match Url::from_file_path(&absolute) {
            Ok(url) => url.to_string(),
            Err(()) => format!("file://{}", absolute.to_string_lossy().replace('\\', "/")),
        }
    }
}
