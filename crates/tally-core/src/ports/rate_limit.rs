//! Rate limiting port.

use async_trait::async_trait;
use std::time::Duration;

/// Rate limiter trait - a per-client gate in front of click submissions.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Check whether `key` may submit now, recording the event if so.
    /// A rejected check leaves the client's state untouched.
    async fn check(&self, key: &str) -> Result<RateLimitResult, RateLimitError>;

    /// Drop state for clients that would be allowed anyway.
    /// Returns the number of clients still tracked.
    fn prune(&self) -> usize {
        0
    }
}

/// Result of a rate limit check.
#[derive(Debug, Clone)]
pub struct RateLimitResult {
    pub allowed: bool,
    /// How long until the client is allowed again (zero when allowed).
    pub retry_after: Duration,
}

impl RateLimitResult {
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            retry_after: Duration::ZERO,
        }
    }

    pub fn rejected(retry_after: Duration) -> Self {
        Self {
            allowed: false,
            retry_after,
        }
    }
}

/// Rate limit errors.
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("Backend error: {0}")]
    Backend(String),
}
