//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod rate_limit;
mod snapshot_store;

pub use rate_limit::{RateLimitError, RateLimitResult, RateLimiter};
pub use snapshot_store::SnapshotStore;
