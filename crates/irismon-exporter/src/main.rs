//! irismon exporter
//!
//! - Scrape endpoint: GET /metrics (Prometheus text format 0.0.4)
//! - Background simulation of Iris model telemetry, once per interval
//! - Runs until SIGINT/SIGTERM, then exits 0

use std::process::ExitCode;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use irismon_core::error::Result;
use irismon_exporter::{app_state::AppState, config, server, sim::Simulator};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, code = e.code(), "irismon-exporter failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let path = std::env::args().nth(1);
    let cfg = config::resolve(path.as_deref())?;
    let listen = cfg.exporter.listen_addr()?;

    let state = AppState::new(cfg)?;
    let simulation = Simulator::from_config(state.registry(), &state.cfg().simulation)?.spawn();

    let listener = TcpListener::bind(listen).await?;
    let local = listener.local_addr()?;
    tracing::info!(
        listen = %local,
        path = %state.cfg().exporter.metrics_path,
        "Prometheus metrics server started on port {}",
        local.port()
    );

    let served = server::serve(listener, state, server::shutdown_signal()).await;

    simulation.stop().await;
    tracing::info!("Shutting down...");
    served
}
