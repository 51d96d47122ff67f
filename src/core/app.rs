//! Application entry point for programs embedding franklinbridge.
//! The program supplies the gateway client, the application loads the configuration
//! and runs the server until Ctrl+C or SIGTERM.
use std::sync::Arc;

use envconfig::Envconfig;
use tokio::signal;
use tokio_util::sync::CancellationToken;

use super::config::{Config, configure_logger};
use crate::integration::franklinwh::Gateway;
use crate::server::server;

pub async fn app<G: Gateway>(gateway: Arc<G>) -> Result<(), anyhow::Error> {
    dotenvy::dotenv().ok();
    configure_logger();

    let config = Config::init_from_env()
        .inspect_err(|e| log::error!("Failed to load configuration: {e}"))?;

    let shutdown_token = CancellationToken::new();
    let server_shutdown_token = shutdown_token.clone();
    let running = server(config, gateway, server_shutdown_token);
    tokio::pin!(running);

    tokio::select! {
        result = &mut running => return result,
        signal = shutdown_signal() => {
            signal?;
            log::info!("Shutdown signal received, initiating graceful shutdown...");
        }
    }
    shutdown_token.cancel();

    running.await?;
    log::info!("Graceful shutdown completed");
    Ok(())
}

/// Wait for either Ctrl+C or SIGTERM.
#[cfg(unix)]
async fn shutdown_signal() -> std::io::Result<()> {
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;
    tokio::select! {
        result = signal::ctrl_c() => result,
        _ = sigterm.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> std::io::Result<()> {
    signal::ctrl_c().await
}
