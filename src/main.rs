//! Operator Catalog Search API
//!
//! A rate-limited, cached search service built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────────────┐
//!                         │                     SEARCH API                        │
//!                         │                                                       │
//!     Client Request      │  ┌──────────┐    ┌────────────┐    ┌──────────────┐   │
//!     ────────────────────┼─▶│   http   │───▶│  security  │───▶│   handlers   │   │
//!                         │  │  server  │    │ rate limit │    │  (criteria)  │   │
//!                         │  └──────────┘    └─────┬──────┘    └──────┬───────┘   │
//!                         │                        │                  │           │
//!                         │                        ▼                  ▼           │
//!                         │                 ┌────────────┐    ┌──────────────┐    │
//!                         │                 │  counter   │    │    cache     │    │
//!                         │                 │   store    │    │ (result TTL) │    │
//!                         │                 └────────────┘    └──────┬───────┘    │
//!                         │                                          │ miss       │
//!                         │                                          ▼           │
//!     Client Response     │                                   ┌──────────────┐    │
//!     ◀───────────────────┼───────────────────────────────────│ search engine│    │
//!                         │                                   │  + catalog   │    │
//!                         │                                   └──────────────┘    │
//!                         │                                                       │
//!                         │  Cross-cutting: config, observability, lifecycle      │
//!                         └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use search_api::config::load_config;
use search_api::lifecycle::signals::shutdown_signal;
use search_api::lifecycle::startup::build_application;
use search_api::observability::{logging, metrics};
use search_api::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "search-api")]
#[command(about = "Paginated, filterable operator catalog search", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);

    tracing::info!("search-api v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        rate_limit = config.rate_limit.limit,
        rate_window_secs = config.rate_limit.window_secs,
        cache_ttl_secs = config.cache.ttl_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let shutdown = Shutdown::new();
    let app = build_application(&config, &shutdown).await?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    HttpServer::new(app.router)
        .run(listener, shutdown_signal())
        .await?;

    shutdown.trigger();
    for handle in app.sweepers {
        let _ = handle.await;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
