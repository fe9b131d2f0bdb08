//! Periodic self-healing of the degrading endpoint.
//!
//! Runs on its own task, independent of any call. Stops when cancelled
//! through its handle or when the shutdown signal fires.

use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::endpoint::degrading::DegradingEndpoint;

/// Handle to a running reset task. Dropping it stops the task.
#[derive(Debug)]
pub struct ResetTask {
    handle: JoinHandle<()>,
}

impl ResetTask {
    /// Stop the task. Calls in flight are unaffected.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the task to exit (after shutdown or cancellation).
    pub async fn join(mut self) {
        if let Err(e) = (&mut self.handle).await {
            if e.is_panic() {
                tracing::error!(error = %e, "Endpoint reset task panicked");
            }
        }
    }
}

impl Drop for ResetTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Spawn the reset loop for `endpoint`, ticking every `reset_period`.
pub fn spawn_reset_task(
    endpoint: DegradingEndpoint,
    mut shutdown: broadcast::Receiver<()>,
) -> ResetTask {
    // interval() panics on a zero period.
    let period = endpoint.reset_period().max(Duration::from_millis(1));
    let handle = tokio::spawn(async move {
        tracing::info!(period_ms = period.as_millis() as u64, "Endpoint reset task starting");

        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    endpoint.reset();
                }
                _ = shutdown.recv() => {
                    tracing::info!("Endpoint reset task received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    });
    ResetTask { handle }
}
