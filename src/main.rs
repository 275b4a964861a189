//! Localized site server.
//!
//! # Architecture Overview
//!
//! ```text
//!     site.toml ──▶ config ──▶ tree (definition file or persisted rows)
//!                                 │
//!                                 ▼
//!                  routing::registry ──▶ cache (valid blob?) ──▶ RouteSet
//!                                 │             │ no
//!                                 │             ▼
//!                                 │      routing::engine (node × locale × action × values)
//!                                 ▼
//!     Client Request ──▶ http::server ──▶ RouteIndex ──▶ locale resolver
//!                                 │                          │
//!                                 ▼                          ▼
//!                         dispatch (guards,           redirect / 404
//!                         controller, view)
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use route_tree::config::load_config;
use route_tree::http::{Dispatcher, SiteServer};
use route_tree::lifecycle::{build_registry, load_tree, spawn_signal_listener, warm_up, Shutdown, StartupError};
use route_tree::observability::{init_logging, init_metrics};
use route_tree::routing::ParameterSources;

#[derive(Parser)]
#[command(name = "route-tree", version, about = "Serve a localized route tree")]
struct Args {
    /// Path to the site configuration
    #[arg(short, long, default_value = "site.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let args = Args::parse();
    let config = load_config(&args.config)?;

    init_logging(&config.observability);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %args.config.display(),
        locales = ?config.locales.available,
        default_locale = %config.locales.default,
        "route-tree starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let tree = load_tree(&config)?;
    let sources = ParameterSources::from_tree(&tree);
    let registry = Arc::new(build_registry(&config, tree, sources));
    warm_up(&registry).await?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    spawn_signal_listener(shutdown.clone());

    let server = SiteServer::new(config, registry, Dispatcher::new());
    server.run(listener, shutdown.wait()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
