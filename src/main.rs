//! Booking gateway
//!
//! Relays same-origin API calls to the remote booking backend.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────┐
//!                      │                 GATEWAY                      │
//!   Client Request     │  ┌─────────┐   ┌──────────┐   ┌──────────┐   │
//!   ───────────────────┼─▶│  http   │──▶│ routing  │──▶│  body    │   │
//!   /api/proxy/{*path} │  │ server  │   │  target  │   │ re-encode│   │
//!                      │  └─────────┘   └──────────┘   └────┬─────┘   │
//!                      │                                     ▼         │
//!   Client Response    │  ┌─────────┐   ┌──────────┐   ┌──────────┐   │
//!   ◀──────────────────┼──│response │◀──│ security │◀──│ upstream │◀──┼── {origin}/api/{path}
//!                      │  │ relay   │   │ headers  │   │  client  │   │
//!                      │  └─────────┘   └──────────┘   └──────────┘   │
//!                      └──────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use booking_gateway::config::{self, ConfigWatcher, GatewayConfig};
use booking_gateway::lifecycle::Shutdown;
use booking_gateway::observability::{logging, metrics};
use booking_gateway::HttpServer;

#[derive(Parser)]
#[command(name = "booking-gateway")]
#[command(about = "Same-origin forwarder for the booking API", long_about = None)]
struct Args {
    /// TOML configuration file. Watched for changes when given.
    #[arg(short, long, env = "BOOKING_GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(long)]
    bind: Option<String>,

    /// Override upstream.origin.
    #[arg(long)]
    upstream: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }
    if let Some(upstream) = args.upstream {
        config.upstream.origin = upstream;
    }
    config::validation::validate_config(&config)
        .map_err(config::ConfigError::Validation)?;

    logging::init_logging(&config.observability);

    tracing::info!("booking-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.origin,
        route_prefix = %config.forwarder.route_prefix,
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

    // Keep the watcher alive for the lifetime of the server.
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

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    shutdown.trigger_on_signal();

    let server = HttpServer::new(config);
    server.run(listener, config_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
