//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gate_events_total` (counter): events by gate and kind
//! - `gate_mode` (gauge): 0=closed, 1=open, 2=half-open
//! - `endpoint_delay_ms` (gauge): current simulated delay
//! - `endpoint_locked_total` (counter): calls refused with `Locked`
//! - `endpoint_resets_total` (counter): effective periodic resets
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

use crate::resilience::circuit_breaker::GateMode;
use crate::resilience::events::EventKind;

/// Install the Prometheus exporter with an HTTP scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_gate_event(gate: &str, kind: EventKind) {
    counter!("gate_events_total", "gate" => gate.to_string(), "kind" => kind.as_str()).increment(1);
}

pub fn record_gate_mode(gate: &str, mode: GateMode) {
    gauge!("gate_mode", "gate" => gate.to_string()).set(mode.as_gauge());
}

pub fn record_endpoint_delay(delay_ms: u64) {
    gauge!("endpoint_delay_ms").set(delay_ms as f64);
}

pub fn record_endpoint_locked() {
    counter!("endpoint_locked_total").increment(1);
}

pub fn record_endpoint_reset() {
    counter!("endpoint_resets_total").increment(1);
}
