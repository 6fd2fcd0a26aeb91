//! Health-aware model router.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────┐
//!                         │                 MODEL ROUTER                  │
//!   POST /interviews/start│  ┌────────┐   ┌──────────┐   ┌────────────┐  │
//!   ──────────────────────┼─▶│  http  │──▶│ routing  │──▶│  upstream  │──┼──▶ /initiate
//!                         │  │handlers│   │ selector │   │ initiator  │  │
//!                         │  └────────┘   └────┬─────┘   └────────────┘  │
//!                         │                    │ pick / refresh          │
//!                         │                    ▼                         │
//!   GET /health           │              ┌──────────┐    ┌──────────┐    │
//!   ──────────────────────┼─────────────▶│  health  │◀───│ monitor  │    │
//!                         │              │ registry │    │ (sweep)  │    │
//!                         │              └────┬─────┘    └──────────┘    │
//!                         │                   │ prober                   │
//!                         └───────────────────┼──────────────────────────┘
//!                                             ▼
//!                                        /probe?model=
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use model_router::config::{self, watcher::ConfigWatcher};
use model_router::lifecycle::{wait_for_signal, Shutdown};
use model_router::observability::{logging, metrics};
use model_router::HttpServer;

#[derive(Parser)]
#[command(name = "model-router")]
#[command(about = "Health-aware router for LLM targets", long_about = None)]
struct Args {
    /// TOML configuration file. Defaults and environment are used when omitted.
    #[arg(short, long, env = "ROUTER_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => config::load_from_env()?,
    };

    logging::init_logging(&config.observability)?;

    tracing::info!("model-router v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        targets = ?config.targets,
        tasks = config.tasks.len(),
        max_ok_ms = config.health_check.max_ok_ms,
        stale_after_ms = config.health_check.stale_after_ms,
        interval_ms = config.health_check.interval_ms,
        "Configuration loaded"
    );

    for warning in config::config_warnings(&config) {
        tracing::warn!(%warning, "Configuration warning");
    }

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

    // The watcher handle must outlive the server.
    let (_watcher, config_updates) = match &args.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        None => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    let server_shutdown = shutdown.subscribe();

    let server_task = tokio::spawn(server.run(listener, config_updates, server_shutdown));

    wait_for_signal().await;
    shutdown.trigger();

    server_task.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}
