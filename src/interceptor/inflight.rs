//! Per-filename in-flight guard.
//!
//! Two rapid activations that derive the same filename would otherwise
//! race the duplicate-suffix scan on publish. The guard serializes
//! activations per derived name; activations for different names never
//! contend.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Keyed lock map. One entry per filename seen this process; entries are
/// small and live for the process lifetime.
#[derive(Debug, Default)]
pub struct InflightGuard {
    keys: DashMap<String, Arc<Mutex<()>>>,
}

impl InflightGuard {
    /// Creates an empty guard.
    #[must_use]
    pub fn new() -> Self {
        Self {
            keys: DashMap::new(),
        }
    }

    /// Acquires the lock for `key`, waiting while another activation for
    /// the same key is in flight.
    ///
    /// The Arc is cloned out of the map entry before awaiting so no map
    /// shard lock is held across the await.
    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .keys
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }
}
