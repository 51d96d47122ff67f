//! Server
use std::sync::Arc;

use crate::core::config::{APP_NAME, APP_VERSION, Config};
use crate::core::container::Container;
use crate::integration::franklinwh::Gateway;
use tokio_util::sync::CancellationToken;

/// Run the server for `gateway` with the given configuration until the shutdown token is cancelled.
/// Returns an error if the gateway credentials are rejected.
pub async fn server<G: Gateway>(
    config: Config,
    gateway: Arc<G>,
    shutdown_token: CancellationToken,
) -> Result<(), anyhow::Error> {
    let container = Container::new(config, gateway, &shutdown_token)?;
    log::info!("{APP_NAME} v{APP_VERSION} started");
    let result = container.bridge_service().run(shutdown_token).await;
    log::debug!("Diagnostics: {}", container.diagnostics());
    container.shutdown();
    log::info!("{APP_NAME} stopped");
    Ok(result?)
}
