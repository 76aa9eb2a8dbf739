//! # TripDesk Back-Office API Server
//!
//! ## Startup
//! ```text
//! ApiConfig::load() ──► telemetry::init() ──► Database::new() (migrations)
//!        │
//!        ▼
//! TcpListener::bind(HTTP_HOST:HTTP_PORT) ──► axum::serve ──► Ctrl+C / SIGTERM
//! ```

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tripdesk_db::Database;

use backoffice_api::{build_router, telemetry, ApiConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ApiConfig::load().context("Failed to load configuration")?;
    telemetry::init(&config.log_level)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        database = %config.database_path.display(),
        "Starting TripDesk back-office API"
    );

    let db = Database::new(config.db_config())
        .await
        .context("Failed to open database")?;

    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "HTTP server listening");

    let app = build_router(AppState::new(db.clone(), config));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Waits for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
