//! Gate lifecycle events and the sinks that receive them.
//!
//! Events are delivered synchronously from inside `fire()`, in the order
//! they happen, and are not retained by the gate.

use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::observability::metrics;

/// Kind of a [`GateEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Success,
    Timeout,
    Failure,
    Reject,
    Open,
    HalfOpen,
    Close,
    Fallback,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Success => "success",
            EventKind::Timeout => "timeout",
            EventKind::Failure => "failure",
            EventKind::Reject => "reject",
            EventKind::Open => "open",
            EventKind::HalfOpen => "half_open",
            EventKind::Close => "close",
            EventKind::Fallback => "fallback",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observable step of a gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateEvent {
    pub gate: Arc<str>,
    pub kind: EventKind,
    pub description: String,
}

impl GateEvent {
    pub fn new(gate: Arc<str>, kind: EventKind, description: impl Into<String>) -> Self {
        Self {
            gate,
            kind,
            description: description.into(),
        }
    }
}

impl fmt::Display for GateEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.gate, self.kind, self.description)
    }
}

/// Append-only consumer of gate events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: GateEvent);
}

impl<S: EventSink + ?Sized> EventSink for Arc<S> {
    fn emit(&self, event: GateEvent) {
        (**self).emit(event)
    }
}

/// Logs every event and counts it in `gate_events_total`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: GateEvent) {
        metrics::record_gate_event(&event.gate, event.kind);
        match event.kind {
            EventKind::Open | EventKind::Timeout | EventKind::Reject | EventKind::Failure => {
                tracing::warn!(gate = %event.gate, kind = %event.kind, "{}", event.description);
            }
            _ => {
                tracing::info!(gate = %event.gate, kind = %event.kind, "{}", event.description);
            }
        }
    }
}

/// Forwards events into an unbounded channel (UIs, test harnesses).
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<GateEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<GateEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: GateEvent) {
        // A dropped receiver just means nobody is listening anymore.
        let _ = self.tx.send(event);
    }
}
