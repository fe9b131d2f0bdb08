//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, percentages <= 100)
//! - Validate addresses and the remote URL
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::{AppConfig, EndpointConfig, GateConfig};

/// A single semantic configuration problem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("remote.url: invalid URL {0:?}")]
    InvalidUrl(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("gate.error_threshold_percent must be at most 100 (got {0})")]
    ThresholdOutOfRange(u8),

    #[error("gate.min_samples must be between 1 and rolling_window_size ({window}), got {min_samples}")]
    MinSamplesOutOfRange { min_samples: usize, window: usize },

    #[error("endpoint.lock_threshold_ms ({lock}) must not be below initial_delay_ms ({initial})")]
    LockBelowInitial { lock: u64, initial: u64 },
}

/// Validate the complete configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if let Some(raw) = &config.remote.url {
        match Url::parse(raw) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => errors.push(ValidationError::InvalidUrl(raw.clone())),
        }
    }
    if config.remote.request_timeout_ms == 0 {
        errors.push(ValidationError::Zero("remote.request_timeout_ms"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }

    errors.extend(validate_gate(&config.gate));
    errors.extend(validate_endpoint(&config.endpoint));

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate the gate section on its own (used by the gate builder too).
pub fn validate_gate(gate: &GateConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if gate.call_timeout_ms == 0 {
        errors.push(ValidationError::Zero("gate.call_timeout_ms"));
    }
    if gate.open_duration_ms == 0 {
        errors.push(ValidationError::Zero("gate.open_duration_ms"));
    }
    if gate.error_threshold_percent > 100 {
        errors.push(ValidationError::ThresholdOutOfRange(gate.error_threshold_percent));
    }
    if gate.rolling_window_size == 0 {
        errors.push(ValidationError::Zero("gate.rolling_window_size"));
    } else {
        let min_samples = gate.min_samples();
        if min_samples == 0 || min_samples > gate.rolling_window_size {
            errors.push(ValidationError::MinSamplesOutOfRange {
                min_samples,
                window: gate.rolling_window_size,
            });
        }
    }

    errors
}

/// Validate the endpoint section on its own.
pub fn validate_endpoint(endpoint: &EndpointConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if endpoint.initial_delay_ms == 0 {
        errors.push(ValidationError::Zero("endpoint.initial_delay_ms"));
    }
    if endpoint.reset_period_ms == 0 {
        errors.push(ValidationError::Zero("endpoint.reset_period_ms"));
    }
    if endpoint.lock_threshold_ms < endpoint.initial_delay_ms {
        errors.push(ValidationError::LockBelowInitial {
            lock: endpoint.lock_threshold_ms,
            initial: endpoint.initial_delay_ms,
        });
    }

    errors
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
