mod config;
mod db;
mod errors;
mod intake;
mod models;
mod routes;
mod state;
mod storage;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::{create_pool, ensure_schema};
use crate::intake::validation::UploadPolicy;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::blobs::BlobStore;
use crate::storage::records::PgApplicantStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing DATABASE_URL)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    ensure_schema(&db).await?;

    // Initialize blob directory
    let blobs = BlobStore::new(&config.upload_dir);
    blobs
        .ensure_root()
        .await
        .with_context(|| format!("Cannot create upload directory '{}'", config.upload_dir))?;

    if config.upload_policy == UploadPolicy::accept_all() {
        info!("Resume uploads accept any file type");
    } else {
        info!("Resume upload policy: {:?}", config.upload_policy);
    }

    let state = AppState {
        store: Arc::new(PgApplicantStore::new(db)),
        blobs,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
