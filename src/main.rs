//! Bike-sharing document services (billing, reservation).
//!
//! # Architecture Overview
//!
//! ```text
//!    Client Request
//!    ──────────────▶ http::server ──▶ http::harness ──▶ services::{billing,reservation}
//!                        │                │                        │
//!                        │          correlation id                 ▼
//!                        │          timing / status           store::DocumentStore
//!                        │                                         ▲
//!                        ▼                                         │ probe
//!    ┌──────────────────────────────── lifecycle ───────────────────────────────┐
//!    │  signals ──┐                                                             │
//!    │  health ───┼──▶ ShutdownCoordinator ──▶ broadcast ──▶ close store ──▶ drain │
//!    │  server ───┘                                                             │
//!    └──────────────────────────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use bikeshare_services::config::loader::load_config;
use bikeshare_services::lifecycle::startup;
use bikeshare_services::observability::{logging, metrics};
use bikeshare_services::ServiceKind;

#[derive(Parser)]
#[command(name = "bikeshare-services")]
#[command(about = "Billing and reservation document services", long_about = None)]
struct Cli {
    /// Which service to run.
    #[arg(value_enum)]
    service: ServiceKind,

    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;

    logging::init(&config.observability)?;

    tracing::info!(service = %cli.service, "{} startup", cli.service.display_name());
    tracing::info!(
        bind_address = %config.listener.bind_address,
        store_backend = ?config.store.backend,
        health_check_interval_secs = config.health_check.interval_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // Validated by load_config.
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    startup::run(cli.service, config).await?;

    tracing::info!("{} graceful shutdown.", cli.service.display_name());
    Ok(())
}
