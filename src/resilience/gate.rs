//! The protective gate: breaker + deadline + fallback + events.
//!
//! `fire()` never fails. It returns either the live payload or the
//! fallback payload and reports what happened through the [`EventSink`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::time::Instant;

use crate::config::validation::{validate_gate, ValidationError};
use crate::config::GateConfig;
use crate::observability::metrics;
use crate::resilience::circuit_breaker::{
    Admission, BreakerState, GateMode, GateSnapshot, Ticket, Transition,
};
use crate::resilience::events::{EventKind, EventSink, GateEvent, TracingSink};
use crate::resilience::operation::{Outcome, RemoteOperation};
use crate::resilience::timeouts::call_with_deadline;
use crate::resilience::window::Sample;

type Fallback<T> = Arc<dyn Fn() -> T + Send + Sync>;

/// Errors raised while assembling a gate.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("no fallback configured for gate {0:?}")]
    MissingFallback(String),

    #[error("invalid gate configuration: {0:?}")]
    InvalidConfig(Vec<ValidationError>),
}

/// What `fire()` hands back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateResponse<T> {
    /// Payload produced by the wrapped operation.
    Live(T),
    /// Payload produced by the fallback.
    Fallback(T),
}

impl<T> GateResponse<T> {
    pub fn is_fallback(&self) -> bool {
        matches!(self, GateResponse::Fallback(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            GateResponse::Live(payload) | GateResponse::Fallback(payload) => payload,
        }
    }

    pub fn source(&self) -> &'static str {
        match self {
            GateResponse::Live(_) => "live",
            GateResponse::Fallback(_) => "fallback",
        }
    }
}

/// Resilience wrapper around a single [`RemoteOperation`].
pub struct ProtectiveGate<T> {
    name: Arc<str>,
    operation: Arc<dyn RemoteOperation<T>>,
    fallback: Fallback<T>,
    sink: Arc<dyn EventSink>,
    config: GateConfig,
    state: Mutex<BreakerState>,
}

impl<T: Send + 'static> ProtectiveGate<T> {
    pub fn builder(operation: impl RemoteOperation<T>) -> GateBuilder<T> {
        GateBuilder {
            name: "gate".to_string(),
            operation: Arc::new(operation),
            fallback: None,
            sink: Arc::new(TracingSink),
            config: GateConfig::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn mode(&self) -> GateMode {
        self.lock().mode()
    }

    pub fn status(&self) -> GateSnapshot {
        self.lock().snapshot(Instant::now())
    }

    /// Invoke the wrapped operation through the gate.
    ///
    /// Events are emitted while the breaker lock is held, so their order
    /// matches the order of the transitions they describe. The fallback
    /// runs outside the lock.
    pub async fn fire(&self) -> GateResponse<T> {
        let ticket = {
            let mut state = self.lock();
            let mut transitions = Vec::new();
            let admission = state.admit(Instant::now(), &mut transitions);
            self.announce(&transitions);
            match admission {
                Admission::Forward(ticket) => ticket,
                Admission::Reject => {
                    self.emit(EventKind::Reject, "gate is open, call not attempted");
                    drop(state);
                    return self.fall_back();
                }
            }
        };

        let mut guard = ProbeGuard {
            state: &self.state,
            ticket,
            armed: true,
        };
        let outcome = call_with_deadline(self.operation.invoke(), self.config.call_timeout()).await;
        guard.armed = false;

        let (sample, kind, description) = match &outcome {
            Outcome::Success {
                observed_delay_ms, ..
            } => (
                Sample::Success,
                EventKind::Success,
                format!("call succeeded (observed delay {observed_delay_ms}ms)"),
            ),
            Outcome::Timeout => (
                Sample::Timeout,
                EventKind::Timeout,
                format!("call exceeded {}ms", self.config.call_timeout_ms),
            ),
            Outcome::Locked => (
                Sample::Failure,
                EventKind::Failure,
                "remote is locked (overloaded)".to_string(),
            ),
            Outcome::Error(reason) => (
                Sample::Failure,
                EventKind::Failure,
                format!("call failed: {reason}"),
            ),
        };

        {
            let mut state = self.lock();
            let mut transitions = Vec::new();
            let applied = state.record(ticket, sample, Instant::now(), &mut transitions);
            if !applied {
                tracing::debug!(gate = %self.name, outcome = outcome.label(), "Discarding outcome of a superseded call");
            }
            self.emit(kind, description);
            self.announce(&transitions);
        }

        match outcome {
            Outcome::Success { payload, .. } => GateResponse::Live(payload),
            Outcome::Timeout | Outcome::Locked | Outcome::Error(_) => self.fall_back(),
        }
    }

    fn fall_back(&self) -> GateResponse<T> {
        let payload = (self.fallback)();
        self.emit(EventKind::Fallback, "fallback response served");
        GateResponse::Fallback(payload)
    }

    fn announce(&self, transitions: &[Transition]) {
        for transition in transitions {
            let (kind, description, mode) = match transition {
                Transition::Opened { failure_percent } => (
                    EventKind::Open,
                    format!(
                        "gate opened at {failure_percent}% failures, rejecting calls for {}ms",
                        self.config.open_duration_ms
                    ),
                    GateMode::Open,
                ),
                Transition::HalfOpened => (
                    EventKind::HalfOpen,
                    "open period elapsed, probing with one call".to_string(),
                    GateMode::HalfOpen,
                ),
                Transition::Closed => (
                    EventKind::Close,
                    "probe succeeded, gate closed".to_string(),
                    GateMode::Closed,
                ),
            };
            metrics::record_gate_mode(&self.name, mode);
            self.emit(kind, description);
        }
    }

    fn emit(&self, kind: EventKind, description: impl Into<String>) {
        self.sink
            .emit(GateEvent::new(self.name.clone(), kind, description));
    }

    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Releases a half-open probe slot if `fire()` is dropped mid-call.
struct ProbeGuard<'a> {
    state: &'a Mutex<BreakerState>,
    ticket: Ticket,
    armed: bool,
}

impl Drop for ProbeGuard<'_> {
    fn drop(&mut self) {
        if self.armed && self.ticket.is_probe() {
            self.state
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .release(self.ticket);
        }
    }
}

/// Builder for [`ProtectiveGate`].
pub struct GateBuilder<T> {
    name: String,
    operation: Arc<dyn RemoteOperation<T>>,
    fallback: Option<Fallback<T>>,
    sink: Arc<dyn EventSink>,
    config: GateConfig,
}

impl<T: Send + 'static> GateBuilder<T> {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn config(mut self, config: GateConfig) -> Self {
        self.config = config;
        self
    }

    /// Substitute response producer. It cannot fail; a panic inside it
    /// propagates out of `fire()`.
    pub fn fallback(mut self, fallback: impl Fn() -> T + Send + Sync + 'static) -> Self {
        self.fallback = Some(Arc::new(fallback));
        self
    }

    pub fn sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.sink = Arc::new(sink);
        self
    }

    pub fn build(self) -> Result<ProtectiveGate<T>, GateError> {
        let errors = validate_gate(&self.config);
        if !errors.is_empty() {
            return Err(GateError::InvalidConfig(errors));
        }
        let fallback = self
            .fallback
            .ok_or_else(|| GateError::MissingFallback(self.name.clone()))?;

        tracing::debug!(
            gate = %self.name,
            call_timeout_ms = self.config.call_timeout_ms,
            error_threshold_percent = self.config.error_threshold_percent,
            open_duration_ms = self.config.open_duration_ms,
            rolling_window_size = self.config.rolling_window_size,
            "Gate configured"
        );
        metrics::record_gate_mode(&self.name, GateMode::Closed);

        Ok(ProtectiveGate {
            name: Arc::from(self.name),
            operation: self.operation,
            fallback,
            sink: self.sink,
            state: Mutex::new(BreakerState::new(&self.config)),
            config: self.config,
        })
    }
}
