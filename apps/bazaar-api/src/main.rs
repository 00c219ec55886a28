//! # Bazaar API Server
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bazaar API Server                                │
//! │                                                                         │
//! │  Back-office client ───► HTTP (8080) ───► Handlers ───► SQLite (WAL)    │
//! │                                                                         │
//! │  Startup: .env → bazaar.toml / BAZAAR_* → tracing → pool + migrations   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use anyhow::Context;
use bazaar_api::config::Settings;
use bazaar_api::{router, AppState};
use bazaar_db::Database;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is normal outside local development
    let _ = dotenvy::dotenv();

    init_tracing();
    info!("Starting Bazaar API v{}", env!("CARGO_PKG_VERSION"));

    let settings = Settings::load().context("loading configuration")?;
    info!(
        database = %settings.database.path.display(),
        "Configuration loaded"
    );

    let db = Database::new(settings.db_config())
        .await
        .context("opening database")?;

    let address = settings.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {address}"))?;
    info!("Listening on http://{}", address);

    let app = router(AppState::new(db.clone(), settings));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber; `RUST_LOG` overrides the default filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,bazaar=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
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

    info!("Shutdown signal received, starting graceful shutdown...");
}
