//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the flaky-gate service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Simulated degrading endpoint.
    pub endpoint: EndpointConfig,

    /// Protective gate wrapped around the remote operation.
    pub gate: GateConfig,

    /// Optional remote target for the gate.
    pub remote: RemoteConfig,

    /// Timeout configuration for the HTTP surface.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Degrading endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Delay served by the first call and restored by every reset.
    pub initial_delay_ms: u64,

    /// Once the delay exceeds this value, calls are answered with `Locked`.
    pub lock_threshold_ms: u64,

    /// Period of the self-healing reset.
    pub reset_period_ms: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 20,
            lock_threshold_ms: 1000,
            reset_period_ms: 20_000,
        }
    }
}

impl EndpointConfig {
    pub fn reset_period(&self) -> Duration {
        Duration::from_millis(self.reset_period_ms)
    }
}

/// Protective gate configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GateConfig {
    /// Milliseconds before a forwarded call is abandoned.
    pub call_timeout_ms: u64,

    /// Failure percentage (0-100) over the rolling window that trips the gate.
    pub error_threshold_percent: u8,

    /// Milliseconds the gate stays open before probing.
    pub open_duration_ms: u64,

    /// Number of outcomes retained for the failure ratio.
    pub rolling_window_size: usize,

    /// Minimum samples before the ratio is considered.
    /// Defaults to `rolling_window_size`.
    pub min_samples: Option<usize>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            call_timeout_ms: 500,
            error_threshold_percent: 50,
            open_duration_ms: 10_000,
            rolling_window_size: 10,
            min_samples: None,
        }
    }
}

impl GateConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    pub fn open_duration(&self) -> Duration {
        Duration::from_millis(self.open_duration_ms)
    }

    /// Effective minimum sample count.
    pub fn min_samples(&self) -> usize {
        self.min_samples.unwrap_or(self.rolling_window_size)
    }
}

/// Remote target configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// URL fetched by the gate. When unset, the gate wraps the
    /// in-process endpoint.
    pub url: Option<String>,

    /// Transport-level timeout of the HTTP client, independent of the
    /// gate's own call deadline.
    pub request_timeout_ms: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: None,
            request_timeout_ms: 5_000,
        }
    }
}

/// Timeout configuration for the HTTP surface.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
