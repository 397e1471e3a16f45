//! In-memory per-client rate limiter using the governor crate.

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use governor::clock::{Clock, DefaultClock};
use governor::middleware::NoOpMiddleware;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter as GovernorRateLimiter};

use tally_core::ports::{RateLimitError, RateLimitResult, RateLimiter};

type KeyedRateLimiter<C> = GovernorRateLimiter<
    String,
    DefaultKeyedStateStore<String>,
    C,
    NoOpMiddleware<<C as Clock>::Instant>,
>;

const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(100);

/// In-memory rate limiter configuration.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Minimum time between two accepted events from one client.
    pub min_interval: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            min_interval: DEFAULT_MIN_INTERVAL,
        }
    }
}

impl RateLimitConfig {
    pub fn from_env() -> Self {
        Self {
            min_interval: std::env::var("RATE_LIMIT_INTERVAL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_MIN_INTERVAL),
        }
    }

    fn quota(&self) -> Quota {
        let period = if self.min_interval.is_zero() {
            DEFAULT_MIN_INTERVAL
        } else {
            self.min_interval
        };

        match Quota::with_period(period) {
            Some(quota) => quota.allow_burst(NonZeroU32::MIN),
            None => Quota::per_second(NonZeroU32::MIN),
        }
    }
}

/// Keyed rate limiter allowing one event per `min_interval` per client.
///
/// GCRA with a burst of one: a client accepted at `t` is rejected until
/// `t + min_interval`, and rejected attempts do not push that point back.
/// Note: Limits are per-process, not distributed across instances.
pub struct InMemoryRateLimiter<C: Clock = DefaultClock> {
    limiter: KeyedRateLimiter<C>,
    clock: C,
}

impl InMemoryRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_clock(config, DefaultClock::default())
    }

    pub fn from_env() -> Self {
        Self::new(RateLimitConfig::from_env())
    }
}

impl<C: Clock + Clone> InMemoryRateLimiter<C> {
    /// Build a limiter that reads time from `clock`.
    pub fn with_clock(config: RateLimitConfig, clock: C) -> Self {
        Self {
            limiter: GovernorRateLimiter::new(
                config.quota(),
                DefaultKeyedStateStore::default(),
                clock.clone(),
            ),
            clock,
        }
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.limiter.len()
    }
}

#[async_trait]
impl<C> RateLimiter for InMemoryRateLimiter<C>
where
    C: Clock + Send + Sync + 'static,
    C::Instant: Send + Sync,
{
    async fn check(&self, key: &str) -> Result<RateLimitResult, RateLimitError> {
        match self.limiter.check_key(&key.to_string()) {
            Ok(_) => Ok(RateLimitResult::allowed()),
            Err(not_until) => Ok(RateLimitResult::rejected(
                not_until.wait_time_from(self.clock.now()),
            )),
        }
    }

    fn prune(&self) -> usize {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
        self.limiter.len()
    }
}
