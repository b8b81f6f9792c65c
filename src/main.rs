mod api_doc;
mod config;
mod error;
mod handlers;
mod models;
mod notice;
mod registry;
mod router;
mod routes;
mod state;
mod store;

use std::sync::Arc;

use anyhow::Context;
use config::Config;
use state::AppState;
use store::{DocumentStore, JsonFileStore};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!("live-endpoints starting");

    let config = Config::from_env()?;
    config.log_startup();

    let store = Arc::new(JsonFileStore::new(&config.endpoints_file));
    if let Err(e) = store.health_check().await {
        tracing::warn!("Snapshot storage at {} is not usable yet: {}", store.path().display(), e);
    }

    let addr = format!("{}:{}", config.service_host, config.service_port);
    let app = routes::build_router(AppState::new(config, store));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("live-endpoints stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
