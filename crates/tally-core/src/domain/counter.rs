//! In-memory counter store - the authoritative country tally.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

/// Point-in-time copy of the counter store.
#[derive(Debug, Clone)]
pub struct CounterSnapshot {
    pub counts: HashMap<String, u64>,
    pub epoch: DateTime<Utc>,
    /// Whether anything changed since the last successful save.
    pub dirty: bool,
    pub(crate) version: u64,
}

impl CounterSnapshot {
    /// Sum over all countries.
    pub fn total(&self) -> u64 {
        self.counts.values().fold(0u64, |acc, c| acc.saturating_add(*c))
    }
}

struct Counters {
    counts: HashMap<String, u64>,
    epoch: DateTime<Utc>,
    // Bumped on every increment; the store is dirty while it differs from
    // `saved_version`.
    version: u64,
    saved_version: u64,
}

/// Country → cumulative click count, guarded by a single map-wide lock.
///
/// Readers (snapshots) share the lock; increments take it exclusively, so
/// every snapshot is a consistent cut and no increment is ever lost.
pub struct CounterStore {
    inner: RwLock<Counters>,
}

impl CounterStore {
    /// Create an empty store whose epoch is the current time.
    pub fn new() -> Self {
        Self::with_epoch(Utc::now())
    }

    pub fn with_epoch(epoch: DateTime<Utc>) -> Self {
        Self {
            inner: RwLock::new(Counters {
                counts: HashMap::new(),
                epoch,
                version: 0,
                saved_version: 0,
            }),
        }
    }

    /// Add `delta` to `country` and mark the store dirty.
    pub async fn increment(&self, country: &str, delta: u64) {
        let mut inner = self.inner.write().await;

        match inner.counts.get_mut(country) {
            Some(count) => *count = count.saturating_add(delta),
            None => {
                inner.counts.insert(country.to_string(), delta);
            }
        }
        inner.version += 1;
    }

    pub async fn snapshot(&self) -> CounterSnapshot {
        let inner = self.inner.read().await;

        CounterSnapshot {
            counts: inner.counts.clone(),
            epoch: inner.epoch,
            dirty: inner.version != inner.saved_version,
            version: inner.version,
        }
    }

    /// Current count for one country.
    pub async fn count(&self, country: &str) -> Option<u64> {
        self.inner.read().await.counts.get(country).copied()
    }

    pub async fn is_dirty(&self) -> bool {
        let inner = self.inner.read().await;
        inner.version != inner.saved_version
    }

    pub async fn epoch(&self) -> DateTime<Utc> {
        self.inner.read().await.epoch
    }

    /// Record that everything up to `version` reached the durable store.
    ///
    /// Increments applied after that snapshot keep the store dirty.
    pub(crate) async fn mark_saved(&self, version: u64) {
        let mut inner = self.inner.write().await;
        inner.saved_version = inner.saved_version.max(version);
    }

    /// Add persisted counters to the in-memory ones.
    ///
    /// Memory only ever holds increments made since process start, so adding
    /// is correct both for the startup load and for a late recovery. The
    /// dirty state is left untouched.
    pub(crate) async fn merge(&self, persisted: HashMap<String, u64>) {
        let mut inner = self.inner.write().await;

        for (country, count) in persisted {
            let entry = inner.counts.entry(country).or_insert(0);
            *entry = entry.saturating_add(count);
        }
    }

    pub(crate) async fn set_epoch(&self, epoch: DateTime<Utc>) {
        self.inner.write().await.epoch = epoch;
    }
}

impl Default for CounterStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_increment_accumulates() {
        let store = CounterStore::new();
        for _ in 0..3 {
            store.increment("Japan", 1).await;
        }
        store.increment("Peru", 10).await;

        assert_eq!(store.count("Japan").await, Some(3));
        assert_eq!(store.count("Peru").await, Some(10));
        assert_eq!(store.snapshot().await.total(), 13);
    }

    #[tokio::test]
    async fn test_countries_are_case_sensitive() {
        let store = CounterStore::new();
        store.increment("japan", 1).await;
        store.increment("Japan", 1).await;

        assert_eq!(store.snapshot().await.counts.len(), 2);
    }

    #[tokio::test]
    async fn test_dirty_tracking() {
        let store = CounterStore::new();
        assert!(!store.is_dirty().await);

        store.increment("Brazil", 2).await;
        let snapshot = store.snapshot().await;
        assert!(snapshot.dirty);

        // An increment lands after the snapshot was taken.
        store.increment("Brazil", 1).await;
        store.mark_saved(snapshot.version).await;
        assert!(store.is_dirty().await);

        let snapshot = store.snapshot().await;
        store.mark_saved(snapshot.version).await;
        assert!(!store.is_dirty().await);
    }

    #[tokio::test]
    async fn test_merge_adds_without_dirtying() {
        let store = CounterStore::new();
        store
            .merge(HashMap::from([("Brazil".to_string(), 5), ("Peru".to_string(), 2)]))
            .await;
        assert!(!store.is_dirty().await);

        store.increment("Peru", 1).await;
        store.merge(HashMap::from([("Peru".to_string(), 4)])).await;
        assert_eq!(store.count("Peru").await, Some(7));
        assert!(store.is_dirty().await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_increments_are_not_lost() {
        const TASKS: u64 = 16;
        const PER_TASK: u64 = 500;

        let store = Arc::new(CounterStore::new());
        let handles: Vec<_> = (0..TASKS)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    for _ in 0..PER_TASK {
                        store.increment("Japan", 1).await;
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.count("Japan").await, Some(TASKS * PER_TASK));
    }
}
