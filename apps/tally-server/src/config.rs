//! Application configuration loaded from environment variables.

use std::env;
use std::time::Duration;

const DEFAULT_SAVE_INTERVAL_SECS: u64 = 600;
const DEFAULT_PRUNE_INTERVAL_SECS: u64 = 300;

/// Application configuration.
///
/// Durable-store and rate-limit settings are read by their own
/// `from_env()` constructors in `tally-infra`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Period of the snapshot timer.
    pub save_interval: Duration,
    /// Period of the rate-limiter pruning sweep.
    pub prune_interval: Duration,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            save_interval: Duration::from_secs(positive_secs(
                "SAVE_INTERVAL_SECS",
                DEFAULT_SAVE_INTERVAL_SECS,
            )),
            prune_interval: Duration::from_secs(positive_secs(
                "RATE_LIMIT_PRUNE_SECS",
                DEFAULT_PRUNE_INTERVAL_SECS,
            )),
        }
    }
}

// Zero would make the timer spin.
fn positive_secs(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(default)
}
