//! Snapshot store implementations - Redis and an in-memory stand-in.

mod memory;

pub use memory::InMemorySnapshotStore;

#[cfg(feature = "redis")]
mod redis;
#[cfg(feature = "redis")]
pub use self::redis::{RedisConfig, RedisSnapshotStore};
