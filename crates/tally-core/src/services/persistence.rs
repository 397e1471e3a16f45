//! Persistence gateway - seeds the counter store on startup and writes
//! snapshots of it to the durable store.
//!
//! The gateway is the only writer of in-memory state besides increments,
//! and only through the load path. A failed startup load leaves the gateway
//! detached: nothing is written until a later save manages to load and merge
//! the persisted counters, so a partial in-memory tally never overwrites the
//! stored totals.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::domain::CounterStore;
use crate::error::StoreError;
use crate::ports::SnapshotStore;

/// What a successful load found.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadSummary {
    pub countries: usize,
    pub total: u64,
    pub epoch: DateTime<Utc>,
    /// The store had no epoch marker and one was created.
    pub epoch_created: bool,
}

/// Outcome of a save attempt that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Nothing changed since the last successful save.
    Skipped,
    Written { countries: usize, total: u64 },
    /// No durable store is configured; the service is memory-only.
    Detached,
}

pub struct PersistenceGateway {
    counters: Arc<CounterStore>,
    backend: Option<Arc<dyn SnapshotStore>>,
    loaded: AtomicBool,
    // A freshly minted epoch that has not reached the store yet.
    epoch_pending: AtomicBool,
    // Serializes load and save so a late recovery never races a write.
    io: Mutex<()>,
}

impl PersistenceGateway {
    pub fn new(counters: Arc<CounterStore>, backend: Arc<dyn SnapshotStore>) -> Self {
        Self {
            counters,
            backend: Some(backend),
            loaded: AtomicBool::new(false),
            epoch_pending: AtomicBool::new(false),
            io: Mutex::new(()),
        }
    }

    /// A gateway without a durable store. Loads fail and saves are skipped.
    pub fn memory_only(counters: Arc<CounterStore>) -> Self {
        Self {
            counters,
            backend: None,
            loaded: AtomicBool::new(false),
            epoch_pending: AtomicBool::new(false),
            io: Mutex::new(()),
        }
    }

    pub fn counters(&self) -> &Arc<CounterStore> {
        &self.counters
    }

    /// Whether persisted state has been merged into memory.
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    /// Seed the counter store from the durable store.
    ///
    /// Errors are meant to be logged by the caller; the service keeps running
    /// memory-only and later saves retry the load.
    pub async fn load(&self) -> Result<LoadSummary, StoreError> {
        let _io = self.io.lock().await;
        self.load_locked().await
    }

    async fn load_locked(&self) -> Result<LoadSummary, StoreError> {
        let backend = self.backend.as_ref().ok_or(StoreError::NotConfigured)?;

        let persisted = backend.load_counts().await?;
        let countries = persisted.len();
        self.counters.merge(persisted).await;

        // Counters are merged at this point; epoch trouble must not fail the load.
        let (epoch, epoch_created) = match backend.load_epoch().await {
            Ok(Some(epoch)) => {
                self.counters.set_epoch(epoch).await;
                (epoch, false)
            }
            Ok(None) => {
                let epoch = self.counters.epoch().await;
                if let Err(e) = backend.save_epoch(epoch).await {
                    tracing::warn!(error = %e, "Failed to persist new epoch; will retry on next save");
                    self.epoch_pending.store(true, Ordering::Release);
                }
                (epoch, true)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load epoch; keeping process start time");
                (self.counters.epoch().await, false)
            }
        };

        self.loaded.store(true, Ordering::Release);

        let total = self.counters.snapshot().await.total();
        tracing::info!(
            countries,
            total,
            epoch = %epoch,
            epoch_created,
            "Loaded counters from durable store"
        );

        Ok(LoadSummary {
            countries,
            total,
            epoch,
            epoch_created,
        })
    }

    /// Write a snapshot of the counter store if anything changed.
    ///
    /// On failure the store stays dirty so the next save picks the delta up.
    pub async fn save(&self) -> Result<SaveOutcome, StoreError> {
        let _io = self.io.lock().await;

        let Some(backend) = self.backend.as_ref() else {
            return Ok(SaveOutcome::Detached);
        };

        if !self.is_loaded() {
            self.load_locked().await?;
        }

        if self.epoch_pending.load(Ordering::Acquire) {
            let epoch = self.counters.epoch().await;
            match backend.save_epoch(epoch).await {
                Ok(()) => {
                    self.epoch_pending.store(false, Ordering::Release);
                    tracing::info!(epoch = %epoch, "Persisted pending epoch");
                }
                Err(e) => tracing::warn!(error = %e, "Failed to persist pending epoch"),
            }
        }

        let snapshot = self.counters.snapshot().await;
        if !snapshot.dirty {
            return Ok(SaveOutcome::Skipped);
        }

        backend.save_counts(&snapshot.counts).await?;
        self.counters.mark_saved(snapshot.version).await;

        Ok(SaveOutcome::Written {
            countries: snapshot.counts.len(),
            total: snapshot.total(),
        })
    }

    /// Live reachability of the durable store.
    pub async fn is_reachable(&self) -> bool {
        match &self.backend {
            Some(backend) => backend.ping().await.is_ok(),
            None => false,
        }
    }
}
