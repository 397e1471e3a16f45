//! Application state - shared across all handlers and the background loop.

use std::sync::Arc;

use tally_core::domain::CounterStore;
use tally_core::ports::RateLimiter;
use tally_core::services::PersistenceGateway;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub counters: Arc<CounterStore>,
    pub persistence: Arc<PersistenceGateway>,
    pub rate_limiter: Arc<dyn RateLimiter>,
}

/// Rate limiter used when the `rate-limit` feature is disabled.
#[cfg(any(test, not(feature = "rate-limit")))]
pub struct UnlimitedRateLimiter;

#[cfg(any(test, not(feature = "rate-limit")))]
#[async_trait::async_trait]
impl RateLimiter for UnlimitedRateLimiter {
    async fn check(
        &self,
        _key: &str,
    ) -> Result<tally_core::ports::RateLimitResult, tally_core::ports::RateLimitError> {
        Ok(tally_core::ports::RateLimitResult::allowed())
    }
}

impl AppState {
    /// Build the application state and seed the counters from the durable
    /// store. An unreachable store is logged and the service runs memory-only.
    pub async fn new() -> Self {
        let counters = Arc::new(CounterStore::new());
        let persistence = Arc::new(Self::persistence(counters.clone()));

        if persistence.has_backend() {
            if let Err(e) = persistence.load().await {
                tracing::warn!(
                    error = %e,
                    "Durable store unavailable; running in memory-only mode until it returns"
                );
            }
        }

        let state = Self::from_parts(persistence, Self::rate_limiter());
        tracing::info!("Application state initialized");
        state
    }

    /// Assemble state from already-built parts.
    pub fn from_parts(
        persistence: Arc<PersistenceGateway>,
        rate_limiter: Arc<dyn RateLimiter>,
    ) -> Self {
        Self {
            counters: persistence.counters().clone(),
            persistence,
            rate_limiter,
        }
    }

    #[cfg(feature = "redis")]
    fn persistence(counters: Arc<CounterStore>) -> PersistenceGateway {
        match tally_infra::RedisSnapshotStore::from_env() {
            Ok(store) => PersistenceGateway::new(counters, Arc::new(store)),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Invalid Redis configuration; data will not persist"
                );
                PersistenceGateway::memory_only(counters)
            }
        }
    }

    #[cfg(not(feature = "redis"))]
    fn persistence(counters: Arc<CounterStore>) -> PersistenceGateway {
        tracing::info!("Running without redis feature - data will not persist");
        PersistenceGateway::memory_only(counters)
    }

    #[cfg(feature = "rate-limit")]
    fn rate_limiter() -> Arc<dyn RateLimiter> {
        Arc::new(tally_infra::InMemoryRateLimiter::from_env())
    }

    #[cfg(not(feature = "rate-limit"))]
    fn rate_limiter() -> Arc<dyn RateLimiter> {
        tracing::info!("Running without rate-limit feature - clicks are not throttled");
        Arc::new(UnlimitedRateLimiter)
    }
}

#[cfg(all(test, not(feature = "redis")))]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn test_build_without_redis_is_memory_only() {
        let state = AppState::new().await;

        assert!(!state.persistence.has_backend());
        state.counters.increment("Japan", 1).await;
        assert_eq!(
            state.persistence.save().await.unwrap(),
            tally_core::services::SaveOutcome::Detached
        );
    }
}
