//! Route handlers.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::http::server::AppState;
use crate::resilience::{GateSnapshot, Outcome};

/// Route of the degrading endpoint.
pub const FLAKY_ROUTE: &str = "/api/flaky";

/// Body of a served `/api/flaky` call.
pub fn flaky_body(delay_ms: u64, observed_delay_ms: u64) -> Value {
    json!({ "delay": delay_ms, "observed_delay_ms": observed_delay_ms })
}

/// Body served by the gate when the real call is skipped or fails.
pub fn fallback_body() -> Value {
    json!({
        "message": format!("{FLAKY_ROUTE} unavailable right now. Try later."),
        "fallback": true
    })
}

#[derive(Serialize)]
pub struct GuardedResponse {
    pub source: &'static str,
    pub body: Value,
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn flaky(State(state): State<AppState>) -> Response {
    match state.endpoint.handle().await {
        Outcome::Success {
            payload,
            observed_delay_ms,
        } => Json(flaky_body(payload, observed_delay_ms)).into_response(),
        Outcome::Locked => (StatusCode::LOCKED, "Locked").into_response(),
        Outcome::Timeout => (StatusCode::GATEWAY_TIMEOUT, "Timeout").into_response(),
        Outcome::Error(reason) => (StatusCode::INTERNAL_SERVER_ERROR, reason).into_response(),
    }
}

pub async fn guarded(State(state): State<AppState>) -> Json<GuardedResponse> {
    let response = state.gate.fire().await;
    Json(GuardedResponse {
        source: response.source(),
        body: response.into_inner(),
    })
}

pub async fn gate_status(State(state): State<AppState>) -> Json<GateSnapshot> {
    Json(state.gate.status())
}
