//! Binary entry point.
//!
//! Loads configuration, initializes logging, wires the drain flag, event bus,
//! and optional supervisor channel into the lifecycle coordinator, then parks:
//! every exit path goes through the coordinator.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{routing::get, Json, Router};
use clap::Parser;

use app_server::config::{load_config, ServerConfig};
use app_server::lifecycle::{Coordinator, DrainFlag, EventBus, RealProcess, SupervisorChannel};
use app_server::{observability, AppServer};

#[derive(Parser)]
#[command(name = "app-server")]
#[command(about = "Supervised HTTP application server", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured port.
    #[arg(long)]
    port: Option<u16>,

    /// Override the configured hostname.
    #[arg(long)]
    hostname: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(hostname) = cli.hostname {
        config.hostname = hostname;
    }

    observability::logging::init(&config.log)?;

    tracing::info!(
        address = %config.bind_address(),
        graceful_exit_timeout_ms = config.graceful_exit_timeout_ms,
        "app-server v0.1.0 starting"
    );

    let supervisor = SupervisorChannel::from_env().await;
    if supervisor.is_some() {
        tracing::debug!("running under a supervisor");
    }

    let drain = DrainFlag::new();
    let routes = Router::new().route("/healthz", get(healthz));
    let server = AppServer::new(&config, routes, drain.clone());
    let coordinator = Coordinator::new(
        &config,
        drain,
        EventBus::new(),
        supervisor,
        Arc::new(RealProcess),
    );

    coordinator.start(server).await;

    // The coordinator owns every exit path; this task only keeps main alive.
    std::future::pending::<()>().await;
    Ok(())
}

async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
