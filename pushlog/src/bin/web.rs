//! Pushlog Web Server - GitHub webhook receiver.
//!
//! This binary:
//! - Receives GitHub `push` and `pull_request` webhooks on `POST /webhook`
//! - Verifies the `X-Hub-Signature-256` signature when a secret is configured
//! - Normalizes each event and appends it to the record store
//! - Serves `GET /health` and `GET /recent`

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pushlog::util::shutdown_signal;
use pushlog::web::{is_signature_verification_enabled, router, AppState};
use pushlog::{open_store, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("web_server_starting");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        host = %config.host,
        port = config.port,
        database_path = %config.database_path,
        signature_verification = is_signature_verification_enabled(&config.github_webhook_secret),
        "config_loaded"
    );

    let store = open_store(&config.database_path).context("Failed to open record store")?;

    let addr = SocketAddr::new(config.host, config.port);
    let app = router(AppState::new(config, store));

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!(address = %addr, "web_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("web_server_shutdown_complete");

    Ok(())
}
