use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use staffing_api::config::{self, StoreBackend};
use staffing_api::database::{Database, MemoryStore, PgStore};
use staffing_api::server;
use staffing_api::state::{AppState, BodyLimits};

#[derive(Debug, Parser)]
#[command(name = "staffing-api", version, about = "Employee and project HTTP service")]
struct Args {
    /// Port to listen on (overrides API_PORT / PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Store backend: postgres or memory (overrides STORE_BACKEND)
    #[arg(long)]
    backend: Option<StoreBackend>,

    /// Postgres connection string (overrides DATABASE_URL)
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, STORE_BACKEND, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config = config::config().clone();
    if let Some(port) = args.port {
        config.api.port = port;
    }
    if let Some(backend) = args.backend {
        config.database.backend = backend;
    }
    if let Some(url) = args.database_url {
        config.database.url = Some(url);
    }
    tracing::info!(
        "Starting staffing API in {:?} mode with {:?} store",
        config.environment,
        config.database.backend
    );

    let limits = BodyLimits::from(&config.api);
    let state = match config.database.backend {
        StoreBackend::Memory => AppState::new(Arc::new(MemoryStore::new()), limits),
        StoreBackend::Postgres => {
            let db = Database::connect(&config.database)
                .await
                .context("failed to connect to Postgres")?;
            db.ensure_schema()
                .await
                .context("failed to prepare schema")?;
            AppState::new(Arc::new(PgStore::new(db)), limits)
        }
    };
    let lifecycle = state.lifecycle.clone();

    let app = server::app(state, &config);

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    lifecycle.close().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
