//! flaky-gate server.
//!
//! ```text
//!                  ┌──────────────────────────────────────────────┐
//!                  │                 flaky-gate                   │
//!   GET /api/flaky │  ┌──────────────────┐                        │
//!  ────────────────┼─▶│ DegradingEndpoint│◀── reset task          │
//!                  │  └────────▲─────────┘    (every period)      │
//!                  │           │ in-process or HTTP (remote.url)  │
//! GET /api/guarded │  ┌────────┴─────────┐     ┌──────────────┐   │
//!  ────────────────┼─▶│  ProtectiveGate  │────▶│ TracingSink  │   │
//!                  │  │ breaker/deadline │     │ logs+metrics │   │
//!                  │  │    /fallback     │     └──────────────┘   │
//!                  │  └──────────────────┘                        │
//!                  └──────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use flaky_gate::config::{load_config, AppConfig};
use flaky_gate::lifecycle::{wait_for_signal, Shutdown};
use flaky_gate::observability::{logging, metrics};
use flaky_gate::HttpServer;

#[derive(Parser)]
#[command(name = "flaky-gate")]
#[command(about = "Degrading endpoint guarded by a circuit-breaking gate", long_about = None)]
struct Args {
    /// Path to a TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability.log_level);
    tracing::info!("flaky-gate v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        initial_delay_ms = config.endpoint.initial_delay_ms,
        lock_threshold_ms = config.endpoint.lock_threshold_ms,
        reset_period_ms = config.endpoint.reset_period_ms,
        call_timeout_ms = config.gate.call_timeout_ms,
        error_threshold_percent = config.gate.error_threshold_percent,
        open_duration_ms = config.gate.open_duration_ms,
        rolling_window_size = config.gate.rolling_window_size,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
