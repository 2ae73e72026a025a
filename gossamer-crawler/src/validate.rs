//! Reachability memoization.

use std::collections::HashMap;
use tokio::sync::Mutex;

/// Caches the outcome of reachability probes per absolute address, so
/// repeated sightings of the same link never re-probe the network.
///
/// Concurrent misses on the same address may both probe; the probe result
/// is a pure function of the target within one run, so the duplicate store
/// is harmless and needs no extra coordination.
#[derive(Default)]
pub struct ValidationCache {
    entries: Mutex<HashMap<String, bool>>,
}

impl ValidationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn cached(&self, address: &str) -> Option<bool> {
        self.entries.lock().await.get(address).copied()
    }

    pub async fn store(&self, address: &str, reachable: bool) {
        self.entries
            .lock()
            .await
            .insert(address.to_string(), reachable);
    }
}
