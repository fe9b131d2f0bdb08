//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! ProtectiveGate::fire()
//!     → circuit_breaker.rs (admit: forward, probe, or reject)
//!     → timeouts.rs (race the operation against the call deadline)
//!     → window.rs (record the sample, re-evaluate the failure ratio)
//!     → events.rs (report outcome and transitions to the sink)
//!     → fallback on reject, timeout, locked or error
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every forwarded call has a deadline
//! - Breaker state is a closed enum with an explicit transition table
//! - `fire()` never surfaces an error; faults are visible only as events

pub mod circuit_breaker;
pub mod events;
pub mod gate;
pub mod operation;
pub mod timeouts;
pub mod window;

pub use circuit_breaker::{GateMode, GateSnapshot};
pub use events::{ChannelSink, EventKind, EventSink, GateEvent, TracingSink};
pub use gate::{GateBuilder, GateError, GateResponse, ProtectiveGate};
pub use operation::{operation_fn, FnOperation, Outcome, RemoteOperation};
