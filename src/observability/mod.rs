//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Endpoint and gate produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Gate events reach logs and metrics through `TracingSink`
//! - Metric recording is cheap and a no-op without an installed exporter

pub mod logging;
pub mod metrics;
