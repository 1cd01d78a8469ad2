//! Ledger API Server Binary
//!
//! # Usage
//!
//! ```bash
//! # Postgres store
//! LEDGER_DATABASE_URL=postgres://... cargo run --bin ledger-api
//!
//! # In-memory store, JSON logs
//! LEDGER_STORE=memory LEDGER_LOG_FORMAT=json cargo run --bin ledger-api
//! ```
//!
//! # Environment Variables
//!
//! * `LEDGER_HOST` - Server host (default: 0.0.0.0)
//! * `LEDGER_PORT` - Server port (default: 8080)
//! * `LEDGER_STORE` - `postgres` or `memory` (default: postgres)
//! * `LEDGER_DATABASE_URL` - PostgreSQL connection string
//! * `LEDGER_MAX_CONNECTIONS` / `LEDGER_MIN_CONNECTIONS` - Pool sizing
//! * `LEDGER_DEFAULT_CURRENCY` - Currency for documents without one (default: USD)
//! * `LEDGER_LOG_LEVEL` - Log level or filter directive (default: info)
//! * `LEDGER_LOG_FORMAT` - `pretty` or `json` (default: pretty)

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use domain_ledger::{InMemoryLedgerStore, LedgerStore};
use infra_db::{create_pool, run_migrations, DatabaseConfig, PgLedgerStore};
use interface_api::config::{ApiConfig, LogFormat, StoreKind};
use interface_api::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("invalid LEDGER_* configuration")?;

    init_tracing(&config.log_level, config.log_format);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        store = ?config.store,
        "Starting ledger API server"
    );

    let store = open_store(&config).await?;
    let state = AppState::new(store, config.clone()).context("invalid default currency")?;
    let app = create_router(state);

    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .context("invalid LEDGER_HOST/LEDGER_PORT")?;

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(log_level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init(),
    }
}

async fn open_store(config: &ApiConfig) -> anyhow::Result<Arc<dyn LedgerStore>> {
    match config.store {
        StoreKind::Memory => {
            tracing::warn!("using the in-memory store; data is lost on shutdown");
            Ok(Arc::new(InMemoryLedgerStore::new()))
        }
        StoreKind::Postgres => {
            let pool = create_pool(
                DatabaseConfig::new(config.database_url.clone())
                    .max_connections(config.max_connections)
                    .min_connections(config.min_connections),
            )
            .await
            .context("failed to connect to PostgreSQL")?;
            run_migrations(&pool)
                .await
                .context("failed to apply ledger migrations")?;
            Ok(Arc::new(PgLedgerStore::new(pool)))
        }
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
