//! Per-source mutual exclusion.
//!
//! Two reconciliations for the same source URL must not interleave their
//! browser calls; reconciliations for different URLs run concurrently.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Lock table keyed by source URL.
///
/// The table itself uses `std::sync::Mutex` (held only for the map lookup);
/// the per-URL locks are async so they can be held across browser calls.
#[derive(Default)]
pub struct PathLocks {
    locks: std::sync::Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl PathLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `source_url`.
    ///
    /// The guard releases the lock when dropped, including on early return.
    pub async fn acquire(&self, source_url: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(locks.entry(source_url.to_string()).or_default())
        };
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_path_is_exclusive() {
        let locks = PathLocks::new();
        let _guard = locks.acquire("file:///a.js").await;

        let second =
            tokio::time::timeout(Duration::from_millis(20), locks.acquire("file:///a.js")).await;
        assert!(second.is_err());
    }

    #[tokio::test]
    async fn test_different_paths_do_not_block() {
        let locks = PathLocks::new();
        let _a = locks.acquire("file:///a.js").await;

        let b = tokio::time::timeout(Duration::from_millis(20), locks.acquire("file:///b.js")).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_released_on_drop() {
        let locks = PathLocks::new();
        drop(locks.acquire("file:///a.js").await);

        let again =
            tokio::time::timeout(Duration::from_millis(20), locks.acquire("file:///a.js")).await;
        assert!(again.is_ok());
    }
}
