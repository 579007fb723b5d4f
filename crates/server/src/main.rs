mod bootstrap;
mod catalog_api;
mod health;

use std::time::Duration;

use anyhow::Result;
use salespoint_core::config::{AppConfig, LoadOptions};

fn init_logging(config: &AppConfig) {
    use salespoint_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(bind_address = %address, "salespoint-server started");

    let drain = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    let server = axum::serve(listener, app.router()).with_graceful_shutdown(wait_for_shutdown());

    tokio::select! {
        result = server => result?,
        // Cap how long in-flight requests may hold up shutdown.
        () = drain_deadline(drain) => {
            tracing::warn!("graceful shutdown window elapsed, exiting");
        }
    }

    tracing::info!("salespoint-server stopping");
    Ok(())
}

async fn wait_for_shutdown() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %error, "shutdown signal listener failed");
    }
}

async fn drain_deadline(drain: Duration) {
    wait_for_shutdown().await;
    tokio::time::sleep(drain).await;
}
