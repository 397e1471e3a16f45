//! In-memory snapshot store - used by tests and local runs without Redis.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use tally_core::StoreError;
use tally_core::ports::SnapshotStore;

/// In-memory snapshot store using a HashMap with async RwLock.
///
/// Can be switched unavailable to simulate an unreachable backend, and
/// counts counter writes so callers can observe redundant saves.
/// Note: Data is lost on process restart.
pub struct InMemorySnapshotStore {
    counts: RwLock<HashMap<String, u64>>,
    epoch: RwLock<Option<DateTime<Utc>>>,
    available: AtomicBool,
    writes: AtomicUsize,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self {
            counts: RwLock::new(HashMap::new()),
            epoch: RwLock::new(None),
            available: AtomicBool::new(true),
            writes: AtomicUsize::new(0),
        }
    }

    /// Simulate the backend going away or coming back.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of successful counter writes so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub async fn stored_counts(&self) -> HashMap<String, u64> {
        self.counts.read().await.clone()
    }

    pub async fn stored_epoch(&self) -> Option<DateTime<Utc>> {
        *self.epoch.read().await
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Connection("in-memory store unavailable".to_string()))
        }
    }
}

impl Default for InMemorySnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn load_counts(&self) -> Result<HashMap<String, u64>, StoreError> {
        self.ensure_available()?;
        Ok(self.counts.read().await.clone())
    }

    async fn save_counts(&self, counts: &HashMap<String, u64>) -> Result<(), StoreError> {
        self.ensure_available()?;

        let mut stored = self.counts.write().await;
        for (country, count) in counts {
            stored.insert(country.clone(), *count);
        }
        self.writes.fetch_add(1, Ordering::SeqCst);

        Ok(())
    }

    async fn load_epoch(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        self.ensure_available()?;
        Ok(*self.epoch.read().await)
    }

    async fn save_epoch(&self, epoch: DateTime<Utc>) -> Result<(), StoreError> {
        self.ensure_available()?;
        *self.epoch.write().await = Some(epoch);
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.ensure_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_overwrites_fields() {
        let store = InMemorySnapshotStore::new();
        store
            .save_counts(&HashMap::from([("Peru".to_string(), 2)]))
            .await
            .unwrap();
        store
            .save_counts(&HashMap::from([("Peru".to_string(), 9), ("Chile".to_string(), 1)]))
            .await
            .unwrap();

        let counts = store.load_counts().await.unwrap();
        assert_eq!(counts.get("Peru"), Some(&9));
        assert_eq!(counts.get("Chile"), Some(&1));
        assert_eq!(store.writes(), 2);
    }

    #[tokio::test]
    async fn test_unavailable_store_fails() {
        let store = InMemorySnapshotStore::new();
        store.set_available(false);

        assert!(store.ping().await.is_err());
        assert!(store.load_counts().await.is_err());
        assert!(store.save_epoch(Utc::now()).await.is_err());
        assert_eq!(store.stored_epoch().await, None);
    }
}
