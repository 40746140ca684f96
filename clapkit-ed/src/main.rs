//! Stage Editor (clapkit-ed) - Main entry point
//!
//! HTTP microservice for editing and validating the two-stage film pipeline
//! documents: load/merge/validate, scene re-segmentation, scene import, and
//! prompt generation. State is in-memory only and replaced wholesale on each
//! load.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clapkit_ed::{build_router, AppState};

/// Command-line arguments for clapkit-ed
#[derive(Parser, Debug)]
#[command(name = "clapkit-ed")]
#[command(about = "Stage editor microservice for CLAPKIT")]
#[command(version)]
struct Args {
    /// Port to listen on (falls back to config file, then the default)
    #[arg(short, long, env = "CLAPKIT_ED_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clapkit_ed=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let port = clapkit_ed::config::resolve_port(args.port);

    info!("Starting CLAPKIT Stage Editor on port {}", port);

    let app = build_router(AppState::new());
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Starting HTTP server on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
