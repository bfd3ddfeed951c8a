//! Last-seen state for polling connectors
//!
//! Connectors record the last observed state of each artifact here so that
//! unchanged artifacts are skipped on the next pass.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[async_trait]
pub trait LastSeenStore: Send + Sync {
    /// Record `state` for `key`; returns true when it differs from the last one
    async fn observe(&self, key: &str, state: &str) -> bool;

    async fn get(&self, key: &str) -> Option<String>;
}

/// Process-local store
#[derive(Debug, Clone, Default)]
pub struct MemoryLastSeenStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryLastSeenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[async_trait]
impl LastSeenStore for MemoryLastSeenStore {
    async fn observe(&self, key: &str, state: &str) -> bool {
        let mut entries = self.entries.lock().await;
        if entries.get(key).map(String::as_str) == Some(state) {
            return false;
        }
        entries.insert(key.to_string(), state.to_string());
        true
    }

    async fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().await.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_observe_detects_changes() {
        let store = MemoryLastSeenStore::new();

        assert!(store.observe("repo/pr/1", "open:t1").await);
        assert!(!store.observe("repo/pr/1", "open:t1").await);
        assert!(store.observe("repo/pr/1", "closed:t2").await);
        assert_eq!(store.get("repo/pr/1").await.as_deref(), Some("closed:t2"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = MemoryLastSeenStore::new();
        let clone = store.clone();

        assert!(store.observe("k", "v").await);
        assert!(!clone.observe("k", "v").await);
        assert_eq!(store.get("missing").await, None);
    }
}
