//! Path resolution port
//!
//! The breakpoint registry is keyed by the URL the browser loads a source
//! from. Turning an IDE file path into that URL is an adapter concern.

/// Maps IDE source paths to browser script URLs.
pub trait PathResolver: Send + Sync {
    fn to_url(&self, path: &str) -> String;
}

/// Uses paths as URLs unchanged. For tests and IDEs that already send URLs.
pub struct IdentityPathResolver;

impl PathResolver for IdentityPathResolver {
    fn to_url(&self, path: &str) -> String {
        path.to_string()
    }
}
