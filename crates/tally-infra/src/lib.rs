//! # Tally Infrastructure
//!
//! Concrete implementations of the ports defined in `tally-core`.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external dependencies, in-memory only
//! - `rate-limit` - Per-client rate limiting via governor
//! - `redis` - Redis-backed snapshot store

pub mod persistence;

#[cfg(feature = "rate-limit")]
pub mod rate_limit;

// Re-exports - In-Memory
pub use persistence::InMemorySnapshotStore;

#[cfg(feature = "rate-limit")]
pub use rate_limit::{InMemoryRateLimiter, RateLimitConfig};

// Re-exports - Redis
#[cfg(feature = "redis")]
pub use persistence::{RedisConfig, RedisSnapshotStore};
