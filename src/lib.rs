//! Resilient invocation of an unreliable remote operation.
//!
//! A [`DegradingEndpoint`] simulates a backend whose latency doubles on
//! every call until a periodic reset heals it. A [`ProtectiveGate`] wraps
//! any [`RemoteOperation`](resilience::RemoteOperation) with a circuit
//! breaker, a call deadline and a fallback, and reports every step to an
//! [`EventSink`](resilience::EventSink).

pub mod config;
pub mod endpoint;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::AppConfig;
pub use endpoint::DegradingEndpoint;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use resilience::{GateResponse, Outcome, ProtectiveGate};
