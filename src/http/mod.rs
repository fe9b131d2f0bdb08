//! HTTP subsystem.
//!
//! # Data Flow
//! ```text
//! GET /api/flaky    → DegradingEndpoint::handle() → 200 {"delay"} | 423 Locked
//! GET /api/guarded  → ProtectiveGate::fire()      → 200 {"source","body"}
//! GET /api/gate     → gate snapshot
//! GET /health       → 200 ok
//! ```
//!
//! # Design Decisions
//! - `Locked` maps to 423, distinct from generic server errors
//! - The guarded route always answers 200; degradation shows in `source`
//! - The gate can wrap this server's own endpoint over HTTP via `remote.url`

pub mod handlers;
pub mod remote;
pub mod server;

pub use remote::HttpOperation;
pub use server::{AppState, HttpServer, ServerError};
