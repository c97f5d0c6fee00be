//! Pushlog Display - prints newly stored webhook records.
//!
//! This binary polls the record store every `POLL_INTERVAL_SECS` seconds and
//! prints a report whenever records appear that were not present on the
//! previous poll. It needs a store shared with the web server, so
//! `DATABASE_PATH` should point at the same SQLite file.

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pushlog::storage::MEMORY_BACKEND;
use pushlog::util::shutdown_signal;
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

    info!("display_starting");

    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        database_path = %config.database_path,
        poll_interval_secs = config.poll_interval.as_secs(),
        display_limit = ?config.display_limit,
        "config_loaded"
    );

    if config.database_path.eq_ignore_ascii_case(MEMORY_BACKEND) {
        warn!("display_memory_store_is_private");
    }

    let store = open_store(&config.database_path).context("Failed to open record store")?;
    store
        .ping()
        .await
        .context("Record store is not reachable")?;
    info!("record_store_reachable");

    DisplayPoller::new(store, config.display_limit)
        .run(config.poll_interval, std::io::stdout(), shutdown_signal())
        .await;

    info!("display_shutdown_complete");

    Ok(())
}
