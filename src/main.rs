//! QR mail gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────────┐
//!                         │                  QRMAIL GATEWAY                  │
//!                         │                                                  │
//!   POST /api/send-email  │  ┌────────┐   ┌──────────┐   ┌──────┐            │
//!   ──────────────────────┼─▶│  http  │──▶│ pipeline │──▶│  qr  │            │
//!                         │  └───┬────┘   └────┬─────┘   └──┬───┘            │
//!                         │      │             │            ▼                │
//!                         │      │             │       ┌───────────┐         │
//!                         │      │             ├──────▶│ artifacts │         │
//!                         │      │             │       └───────────┘         │
//!                         │      │             ▼                             │
//!                         │      │        ┌────────┐                         │     SMTP
//!                         │      │        │  mail  │─────────────────────────┼───▶ relay
//!                         │      │        └────────┘                         │
//!   POST /contract/       │      ▼                                           │
//!   interact              │  ┌────────────┐                                  │     JSON-RPC
//!   ──────────────────────┼─▶│ blockchain │──────────────────────────────────┼───▶ node
//!                         │  └────────────┘                                  │
//!                         │                                                  │
//!                         │  config · observability · lifecycle              │
//!                         └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use qrmail_gateway::config::{load_config, loader::CONFIG_PATH_ENV_VAR};
use qrmail_gateway::lifecycle::{initialize, wait_for_signal, Shutdown};
use qrmail_gateway::observability::{logging, metrics};
use qrmail_gateway::HttpServer;

#[derive(Parser)]
#[command(name = "qrmail-gateway", version, about = "QR code email and proof submission gateway")]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long, env = CONFIG_PATH_ENV_VAR)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Missing .env is normal in production.
    let dotenv = dotenvy::dotenv();

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "qrmail-gateway starting");
    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "Loaded .env");
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        smtp_host = %config.mail.smtp_host,
        smtp_port = config.mail.smtp_port,
        artifact_dir = %config.artifacts.directory,
        ledger_enabled = config.ledger.enabled,
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

    let state = initialize(&config).await?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.trigger();
    });

    HttpServer::new(&config.http, state)
        .run(listener, server_shutdown)
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
