use anyhow::Context;
use dotenvy::dotenv;
use log::{error, info};
use std::sync::Arc;
use std::time::Duration;

use toolboard::core::config::AppConfig;
use toolboard::layout::client::HttpLayoutApi;
use toolboard::layout::service::LayoutService;
use toolboard::web::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::load().context("loading configuration")?;
    info!(
        "Backend API at {} (query timeout {}s)",
        config.api.base_url, config.api.query_timeout_secs
    );

    let api = HttpLayoutApi::new(&config.api).context("building backend client")?;
    let service = LayoutService::new(
        Arc::new(api),
        Duration::from_secs(config.api.query_timeout_secs),
    );

    let addr = config.bind_address();
    let app = build_router(Arc::new(AppState::new(service, config)));

    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
        error!("Failed to bind to {addr}: {e} - is another instance running?");
        e
    })?;
    info!("HTTP server listening on {addr}");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
    }
    info!("Shutting down...");
}
