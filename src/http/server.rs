//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with all handlers
//! - Wire up middleware (tracing, request timeout, request ID)
//! - Build the gate around either the in-process endpoint or a remote URL
//! - Run the endpoint's reset task alongside the server
//! - Stop both on the shutdown signal

use axum::{routing::get, Router};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use url::Url;

use crate::config::AppConfig;
use crate::endpoint::{spawn_reset_task, DegradingEndpoint};
use crate::http::handlers;
use crate::http::remote::HttpOperation;
use crate::resilience::{operation_fn, GateError, Outcome, ProtectiveGate, TracingSink};

/// Name of the gate guarding `/api/guarded`, after the route it protects.
pub const GATE_NAME: &str = "flaky";

/// Errors raised while assembling the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("gate setup failed: {0}")]
    Gate(#[from] GateError),

    #[error("invalid remote URL: {0}")]
    RemoteUrl(#[from] url::ParseError),

    #[error("HTTP client setup failed: {0}")]
    Client(#[from] reqwest::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub endpoint: DegradingEndpoint,
    pub gate: Arc<ProtectiveGate<Value>>,
}

/// HTTP server exposing the degrading endpoint and the gate in front of it.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: AppConfig) -> Result<Self, ServerError> {
        let endpoint = DegradingEndpoint::new(&config.endpoint);
        let gate = Arc::new(Self::build_gate(&config, &endpoint)?);

        let state = AppState { endpoint, gate };
        let router = Self::build_router(&config, state.clone());
        Ok(Self { router, state })
    }

    fn build_gate(
        config: &AppConfig,
        endpoint: &DegradingEndpoint,
    ) -> Result<ProtectiveGate<Value>, ServerError> {
        let builder = match &config.remote.url {
            Some(raw) => {
                let operation = HttpOperation::new(
                    Url::parse(raw)?,
                    Duration::from_millis(config.remote.request_timeout_ms),
                )?;
                tracing::info!(url = %operation.url(), "Gate wraps remote endpoint");
                ProtectiveGate::builder(operation)
            }
            None => {
                tracing::info!("Gate wraps in-process endpoint");
                let endpoint = endpoint.clone();
                ProtectiveGate::builder(operation_fn(move || {
                    let endpoint = endpoint.clone();
                    async move { in_process_call(&endpoint).await }
                }))
            }
        };

        Ok(builder
            .name(GATE_NAME)
            .config(config.gate.clone())
            .fallback(handlers::fallback_body)
            .sink(TracingSink)
            .build()?)
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: AppState) -> Router {
        Router::new()
            .route("/health", get(handlers::health))
            .route(handlers::FLAKY_ROUTE, get(handlers::flaky))
            .route("/api/guarded", get(handlers::guarded))
            .route("/api/gate", get(handlers::gate_status))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let reset_task = spawn_reset_task(self.state.endpoint.clone(), shutdown.resubscribe());

        let served = axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await;

        reset_task.cancel();
        served?;
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn in_process_call(endpoint: &DegradingEndpoint) -> Outcome<Value> {
    match endpoint.handle().await {
        Outcome::Success {
            payload,
            observed_delay_ms,
        } => Outcome::Success {
            payload: handlers::flaky_body(payload, observed_delay_ms),
            observed_delay_ms,
        },
        Outcome::Locked => Outcome::Locked,
        Outcome::Timeout => Outcome::Timeout,
        Outcome::Error(reason) => Outcome::Error(reason),
    }
}
