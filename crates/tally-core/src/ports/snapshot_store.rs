//! Durable snapshot store port.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;

/// Durable key-value backend holding the counter hash and the service epoch.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Fetch every persisted country counter.
    async fn load_counts(&self) -> Result<HashMap<String, u64>, StoreError>;

    /// Write every country counter in `counts`, overwriting stored values.
    async fn save_counts(&self, counts: &HashMap<String, u64>) -> Result<(), StoreError>;

    /// Fetch the epoch marker, `None` on a fresh store.
    async fn load_epoch(&self) -> Result<Option<DateTime<Utc>>, StoreError>;

    async fn save_epoch(&self, epoch: DateTime<Utc>) -> Result<(), StoreError>;

    /// Check live reachability.
    async fn ping(&self) -> Result<(), StoreError>;
}
