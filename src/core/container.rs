//! Dependency injection container for franklinbridge.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::config::Config;
use crate::coordinator::PollingCoordinator;
use crate::diagnostics;
use crate::entities::Device;
use crate::integration::franklinwh::Gateway;
use crate::integration::homeassistant;
use crate::services::{GatewayBridgeService, GatewayControl, GatewayFetcher};

/// Container construction errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Gateway id mismatch: configured {configured}, gateway reports {reported}")]
    GatewayMismatch {
        configured: String,
        reported: String,
    },
    #[error(transparent)]
    HomeAssistant(#[from] homeassistant::Error),
}

/// Container for application dependencies.
pub struct Container<G: Gateway> {
    config: Arc<Config>,
    coordinator: Arc<PollingCoordinator<GatewayFetcher<G>>>,
    homeassistant: Arc<homeassistant::Client>,
    control: Arc<GatewayControl<G>>,
    bridge_service: Arc<GatewayBridgeService<G>>,
}

impl<G: Gateway> Container<G> {
    /// Creates a new instance of the dependency injection container.
    /// The coordinator stops when `shutdown_token` is cancelled.
    /// Fails if `gateway` is not the gateway configured by `GATEWAY_ID`.
    pub fn new(
        config: Config,
        gateway: Arc<G>,
        shutdown_token: &CancellationToken,
    ) -> Result<Self, Error> {
        if !config.gateway_id.eq_ignore_ascii_case(gateway.gateway_id()) {
            return Err(Error::GatewayMismatch {
                configured: config.gateway_id,
                reported: gateway.gateway_id().to_string(),
            });
        }
        let config = Arc::new(config);

        let coordinator = Arc::new(PollingCoordinator::new(
            Device::new(gateway.gateway_id()).name(),
            GatewayFetcher::new(gateway),
            config.coordinator_settings(),
            shutdown_token,
        ));

        let homeassistant = Arc::new(homeassistant::Client::new(
            config.homeassistant_url.clone(),
            config.homeassistant_token.clone(),
        )?);

        let control = Arc::new(GatewayControl::new(
            Arc::clone(&coordinator),
            config.command_settle_delay.into(),
        ));

        let bridge_service = Arc::new(GatewayBridgeService::new(
            Arc::clone(&coordinator),
            Arc::clone(&homeassistant),
            config.setup_retry_interval.into(),
        ));

        Ok(Self {
            config,
            coordinator,
            homeassistant,
            control,
            bridge_service,
        })
    }

    /// Returns a reference to the application config.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns a reference to the gateway coordinator.
    pub fn coordinator(&self) -> Arc<PollingCoordinator<GatewayFetcher<G>>> {
        Arc::clone(&self.coordinator)
    }

    /// Returns a reference to the HomeAssistant client.
    pub fn homeassistant_client(&self) -> Arc<homeassistant::Client> {
        Arc::clone(&self.homeassistant)
    }

    /// Returns a reference to the gateway control.
    pub fn control(&self) -> Arc<GatewayControl<G>> {
        Arc::clone(&self.control)
    }

    /// Returns a reference to the bridge service.
    pub fn bridge_service(&self) -> Arc<GatewayBridgeService<G>> {
        Arc::clone(&self.bridge_service)
    }

    /// Diagnostics of the current coordinator state.
    pub fn diagnostics(&self) -> serde_json::Value {
        diagnostics::collect(&self.config, &self.coordinator.get_snapshot())
    }

    /// Shutdown the container and stop polling.
    pub fn shutdown(&self) {
        self.coordinator.request_shutdown();
    }
}
