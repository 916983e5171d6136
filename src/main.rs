//! LeoConnect backend server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ axum (TraceLayer, TimeoutLayer, fallback entry)
//!                         │
//!                         ▼
//!                     dispatch ── request adapter ──▶ ParsedRequest
//!                         │
//!                         ▼
//!                     Router (preflight → match → gate → handler)
//!                         │                          │
//!                         │                          ▼
//!                         │                    Store (memory)
//!                         ▼
//!     Client Response ◀── Finalized response (CORS, X-Request-Id)
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use leoconnect::config;
use leoconnect::http::HttpServer;
use leoconnect::lifecycle::{signals, Shutdown};
use leoconnect::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "leoconnect")]
#[command(about = "LeoConnect social network backend", long_about = None)]
struct Args {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = config::load(args.config.as_deref())?;

    logging::init(&config.observability.log_level)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "leoconnect starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_body_size = config.http.max_body_size,
        request_timeout_secs = config.http.request_timeout_secs,
        seeded_clubs = config.seed.clubs.len(),
        "Configuration loaded"
    );
    if config.auth.secret().is_none() {
        tracing::warn!(
            "No JWT secret configured (set {}); login and authenticated routes will return 500",
            config::loader::JWT_SECRET_ENV
        );
    }

    if config.observability.metrics_enabled {
        // Address already checked by config validation.
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    let server_shutdown = shutdown.subscribe();
    let server_task = tokio::spawn(server.run(listener, server_shutdown));

    signals::shutdown_on_signal(&shutdown).await?;
    server_task.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}
