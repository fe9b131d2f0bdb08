//! Degrading endpoint.
//!
//! # Responsibilities
//! - Serve calls with a delay that doubles after every serviced call
//! - Refuse calls (`Locked`) once the delay passes the lock threshold
//! - Restore the initial delay on `reset()`
//!
//! # Design Decisions
//! - A call waits for the delay it read on entry, and its payload is
//!   derived from that same value
//! - A reset supersedes calls already in flight: their doubling is not
//!   applied on top of the restored delay
//! - Cheap to clone; clones share the same delay state

use futures_util::future::BoxFuture;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time;

use crate::config::EndpointConfig;
use crate::observability::metrics;
use crate::resilience::{Outcome, RemoteOperation};

#[derive(Debug)]
struct DelayState {
    current_delay_ms: u64,
    /// Incremented by every effective reset.
    epoch: u64,
}

#[derive(Debug)]
struct Inner {
    initial_delay_ms: u64,
    lock_threshold_ms: u64,
    state: Mutex<DelayState>,
}

/// Simulated backend whose latency grows until it is reset.
#[derive(Debug, Clone)]
pub struct DegradingEndpoint {
    inner: Arc<Inner>,
    reset_period: Duration,
}

impl DegradingEndpoint {
    pub fn new(config: &EndpointConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                initial_delay_ms: config.initial_delay_ms,
                lock_threshold_ms: config.lock_threshold_ms,
                state: Mutex::new(DelayState {
                    current_delay_ms: config.initial_delay_ms,
                    epoch: 0,
                }),
            }),
            reset_period: config.reset_period(),
        }
    }

    pub fn initial_delay_ms(&self) -> u64 {
        self.inner.initial_delay_ms
    }

    pub fn lock_threshold_ms(&self) -> u64 {
        self.inner.lock_threshold_ms
    }

    pub fn reset_period(&self) -> Duration {
        self.reset_period
    }

    pub fn current_delay_ms(&self) -> u64 {
        self.lock().current_delay_ms
    }

    /// Serve one call.
    ///
    /// Returns `Locked` without waiting when the delay is above the lock
    /// threshold. Otherwise waits for the current delay, doubles it, and
    /// reports the doubled value as payload.
    pub async fn handle(&self) -> Outcome<u64> {
        let (delay_ms, epoch) = {
            let state = self.lock();
            (state.current_delay_ms, state.epoch)
        };

        if delay_ms > self.inner.lock_threshold_ms {
            tracing::debug!(delay_ms, threshold_ms = self.inner.lock_threshold_ms, "Endpoint locked");
            metrics::record_endpoint_locked();
            return Outcome::Locked;
        }

        time::sleep(Duration::from_millis(delay_ms)).await;

        let next_delay_ms = delay_ms.saturating_mul(2);
        {
            let mut state = self.lock();
            if state.epoch == epoch {
                state.current_delay_ms = state.current_delay_ms.saturating_mul(2);
                metrics::record_endpoint_delay(state.current_delay_ms);
            } else {
                tracing::debug!(delay_ms, "Endpoint was reset during the call; keeping restored delay");
            }
        }

        Outcome::Success {
            payload: next_delay_ms,
            observed_delay_ms: delay_ms,
        }
    }

    /// Restore the initial delay. Returns whether anything changed.
    pub fn reset(&self) -> bool {
        let mut state = self.lock();
        if state.current_delay_ms == self.inner.initial_delay_ms {
            return false;
        }
        tracing::info!(
            from_ms = state.current_delay_ms,
            to_ms = self.inner.initial_delay_ms,
            "Resetting endpoint delay"
        );
        state.current_delay_ms = self.inner.initial_delay_ms;
        state.epoch += 1;
        metrics::record_endpoint_reset();
        metrics::record_endpoint_delay(state.current_delay_ms);
        true
    }

    fn lock(&self) -> MutexGuard<'_, DelayState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RemoteOperation<u64> for DegradingEndpoint {
    fn invoke(&self) -> BoxFuture<'static, Outcome<u64>> {
        let endpoint = self.clone();
        Box::pin(async move { endpoint.handle().await })
    }
}
