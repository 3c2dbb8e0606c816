//! Similar-products service.
//!
//! Resolves the similar products of a catalog product by fanning out to the
//! upstream catalog service, guarded by circuit breakers and fronted by a
//! TTL cache.
//!
//! # Architecture Overview
//!
//! ```text
//!   GET /product/{id}/similar
//!          │
//!          ▼
//!   ┌─────────────┐   hit   ┌──────────────┐
//!   │    http     │────────▶│ result cache │
//!   │  handlers   │         └──────────────┘
//!   └──────┬──────┘               ▲ write
//!          ▼                      │
//!   ┌─────────────────────────────┴──┐
//!   │      aggregation pipeline      │
//!   └──────┬──────────────────┬──────┘
//!          ▼                  ▼
//!   [similar-ids breaker] [product-by-id breaker] × N
//!          │                  │
//!          ▼                  ▼
//!   ┌────────────────────────────────┐
//!   │    upstream catalog (reqwest)  │
//!   └────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use similar_products::config::{resolve_config, ENV_CONFIG_PATH};
use similar_products::lifecycle::{signals, Application, Shutdown};
use similar_products::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "similar-products")]
#[command(about = "Similar products aggregation service", long_about = None)]
struct Args {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, env = ENV_CONFIG_PATH)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = resolve_config(args.config.as_deref())?;

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "similar-products starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let app = Application::build(config)?;
    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    app.run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
