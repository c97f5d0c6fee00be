//! Pushlog - webhook receiver and display poller in one process.
//!
//! Both halves share a single record store, so this is the binary to use
//! with `DATABASE_PATH=memory`. SIGINT / SIGTERM stops the server gracefully
//! and lets an in-flight display tick finish. If the server stops on its own,
//! the display stops with it.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pushlog::util::{shutdown_signal, ShutdownHandle};
use pushlog::web::{is_signature_verification_enabled, router, AppState};
use pushlog::{open_store, Config, DisplayPoller};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true).with_writer(std::io::stderr))
        .init();

    info!("pushlog_starting");

    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        host = %config.host,
        port = config.port,
        database_path = %config.database_path,
        signature_verification = is_signature_verification_enabled(&config.github_webhook_secret),
        poll_interval_secs = config.poll_interval.as_secs(),
        display_limit = ?config.display_limit,
        "config_loaded"
    );

    let store = open_store(&config.database_path).context("Failed to open record store")?;

    let addr = SocketAddr::new(config.host, config.port);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!(address = %addr, "web_server_listening");

    let poller = DisplayPoller::new(store.clone(), config.display_limit);
    let poll_interval = config.poll_interval;
    let app = router(AppState::new(config, store));

    // Fan the one OS signal out to both halves
    let shutdown = ShutdownHandle::new();
    let on_signal = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        on_signal.trigger();
    });

    let server = async {
        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.wait())
            .await
            .context("Server error");
        shutdown.trigger();
        served
    };
    let display = poller.run(poll_interval, std::io::stdout(), shutdown.wait());

    let (served, ()) = tokio::join!(server, display);
    served?;

    info!("pushlog_shutdown_complete");

    Ok(())
}
