//! Simulated unreliable backend.
//!
//! # Data Flow
//! ```text
//! handle():
//!     delay > lock threshold?  → Locked (no wait)
//!     otherwise                → wait(delay) → delay *= 2 → Success(delay)
//!
//! reset task (every reset_period):
//!     delay != initial?        → delay = initial
//! ```
//!
//! # Design Decisions
//! - Delay state is owned by one `DegradingEndpoint` instance, never global
//! - Reset runs on its own task and is cancelled independently of calls
//! - `Locked` is designed behaviour under load, not a fault

pub mod degrading;
pub mod reset;

pub use degrading::DegradingEndpoint;
pub use reset::{spawn_reset_task, ResetTask};
