//! Save loop and shutdown coordination.
//!
//! One background task owns the snapshot timer and the rate-limiter pruning
//! timer. It stops on a one-shot cancellation signal, performs exactly one
//! final save and reports `Stopped`. The caller awaits that completion
//! before the process exits.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use tally_core::ports::RateLimiter;
use tally_core::services::{PersistenceGateway, SaveOutcome};

use crate::config::AppConfig;

/// Where the save loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Running,
    Saving,
    ShuttingDown,
    Stopped,
}

#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    pub save_interval: Duration,
    pub prune_interval: Duration,
}

impl From<&AppConfig> for LifecycleConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            save_interval: config.save_interval,
            prune_interval: config.prune_interval,
        }
    }
}

/// Handle to the running save loop.
pub struct Lifecycle {
    cancel: oneshot::Sender<()>,
    task: JoinHandle<()>,
    state: watch::Receiver<LifecycleState>,
}

impl Lifecycle {
    /// Spawn the save loop on the current runtime.
    pub fn spawn(
        persistence: Arc<PersistenceGateway>,
        rate_limiter: Arc<dyn RateLimiter>,
        config: LifecycleConfig,
    ) -> Self {
        let (cancel, cancelled) = oneshot::channel();
        let (state_tx, state) = watch::channel(LifecycleState::Running);

        tracing::info!(
            save_interval_secs = config.save_interval.as_secs(),
            prune_interval_secs = config.prune_interval.as_secs(),
            "Save loop started"
        );

        let task = tokio::spawn(run(persistence, rate_limiter, config, cancelled, state_tx));

        Self {
            cancel,
            task,
            state,
        }
    }

    #[cfg(test)]
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.clone()
    }

    /// Cancel the loop and wait for its final save.
    pub async fn shutdown(self) {
        // The loop also treats a dropped sender as cancellation.
        let _ = self.cancel.send(());

        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Save loop terminated abnormally");
        }
        tracing::debug!(state = ?*self.state.borrow(), "Save loop finished");
    }
}

async fn run(
    persistence: Arc<PersistenceGateway>,
    rate_limiter: Arc<dyn RateLimiter>,
    config: LifecycleConfig,
    mut cancelled: oneshot::Receiver<()>,
    state: watch::Sender<LifecycleState>,
) {
    let mut save_ticker = ticker(config.save_interval);
    let mut prune_ticker = ticker(config.prune_interval);

    loop {
        tokio::select! {
            _ = &mut cancelled => break,
            _ = save_ticker.tick() => {
                state.send_replace(LifecycleState::Saving);
                save(&persistence, "periodic").await;
                state.send_replace(LifecycleState::Running);
            }
            _ = prune_ticker.tick() => {
                let tracked = rate_limiter.prune();
                tracing::debug!(tracked, "Pruned rate limiter");
            }
        }
    }

    state.send_replace(LifecycleState::ShuttingDown);
    tracing::info!("Stopping save loop");

    state.send_replace(LifecycleState::Saving);
    save(&persistence, "final").await;

    state.send_replace(LifecycleState::Stopped);
}

// First tick one full period from now, not immediately.
fn ticker(period: Duration) -> tokio::time::Interval {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

async fn save(persistence: &PersistenceGateway, trigger: &'static str) {
    match persistence.save().await {
        Ok(SaveOutcome::Written { countries, total }) => {
            tracing::info!(trigger, countries, total, "Saved snapshot to durable store");
        }
        Ok(SaveOutcome::Skipped) => {
            tracing::debug!(trigger, "No changes since last save");
        }
        Ok(SaveOutcome::Detached) => {
            tracing::debug!(trigger, "Memory-only mode, snapshot not written");
        }
        Err(e) => {
            tracing::error!(trigger, error = %e, "Snapshot save failed; will retry at next tick");
        }
    }
}
