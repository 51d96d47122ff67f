//! Gateway Bridge Background Service.
//! This service keeps a FranklinWH gateway and Home Assistant in sync: it sets the gateway up,
//! runs the polling coordinator and publishes every entity state that changes.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::fetcher::{DataPart, GatewayFetcher};
use crate::coordinator::{Classify, FailureKind, PollingCoordinator, UpdateError};
use crate::entities::{
    BackupReserve, Device, Entity, GeneratorSwitch, GridSwitch, ModeSelect, Sensor, SmartSwitch,
    render,
};
use crate::integration::franklinwh::{AccessoryType, Gateway};
use crate::integration::homeassistant::{self, StateCreateOrUpdate};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SetupError {
    /// Credentials were rejected, setup is not retried.
    #[error("Authentication failed: {0}")]
    AuthFailed(String),
    #[error("Gateway not ready: {0}")]
    NotReady(String),
    #[error("Shutdown requested")]
    Shutdown,
}

impl From<UpdateError> for SetupError {
    fn from(err: UpdateError) -> Self {
        match err {
            UpdateError::AuthFailed(message) => SetupError::AuthFailed(message),
            UpdateError::Shutdown => SetupError::Shutdown,
            err => SetupError::NotReady(err.to_string()),
        }
    }
}

pub struct GatewayBridgeService<G: Gateway> {
    device: Device,
    coordinator: Arc<PollingCoordinator<GatewayFetcher<G>>>,
    homeassistant: Arc<homeassistant::Client>,
    setup_retry_interval: Duration,
}

impl<G: Gateway> GatewayBridgeService<G> {
    /// Creates a new instance of `GatewayBridgeService`.
    pub fn new(
        coordinator: Arc<PollingCoordinator<GatewayFetcher<G>>>,
        homeassistant: Arc<homeassistant::Client>,
        setup_retry_interval: Duration,
    ) -> Self {
        let device = Device::new(coordinator.fetcher().gateway().gateway_id());
        GatewayBridgeService {
            device,
            coordinator,
            homeassistant,
            setup_retry_interval,
        }
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Discover the accessories, build the entities and fetch the first data.
    pub async fn setup(&self) -> Result<Vec<Box<dyn Entity>>, SetupError> {
        self.homeassistant
            .check_api()
            .await
            .map_err(|e| SetupError::NotReady(format!("Home Assistant: {e}")))?;

        let accessories = self
            .coordinator
            .fetcher()
            .gateway()
            .get_accessories()
            .await
            .map_err(|e| match e.failure_kind() {
                FailureKind::Auth => SetupError::AuthFailed(e.to_string()),
                FailureKind::Transient => SetupError::NotReady(e.to_string()),
            })?;
        let has = |wanted: AccessoryType| accessories.iter().any(|a| a.accessory_type == wanted);

        let fetcher = self.coordinator.fetcher();
        let mut entities: Vec<Box<dyn Entity>> = Vec::new();
        entities.extend(
            Sensor::all(&self.device)
                .into_iter()
                .map(|sensor| Box::new(sensor) as Box<dyn Entity>),
        );
        entities.push(Box::new(GridSwitch::new(&self.device)));
        if has(AccessoryType::SmartCircuitModule) {
            fetcher.enable(DataPart::SwitchState);
            entities.extend(
                SmartSwitch::all(&self.device)
                    .into_iter()
                    .map(|switch| Box::new(switch) as Box<dyn Entity>),
            );
        }
        if has(AccessoryType::GeneratorModule) {
            entities.push(Box::new(GeneratorSwitch::new(&self.device)));
        }
        fetcher.enable(DataPart::Mode);
        entities.push(Box::new(ModeSelect::new(&self.device)));
        entities.push(Box::new(BackupReserve::new(&self.device)));

        self.coordinator.first_refresh().await?;
        log::info!(
            "{} set up with {} accessories and {} entities",
            self.device.name(),
            accessories.len(),
            entities.len()
        );
        Ok(entities)
    }

    /// Run setup until it succeeds, then poll and publish until shutdown.
    /// Returns an error if the credentials are rejected.
    pub async fn run(&self, shutdown_token: CancellationToken) -> Result<(), SetupError> {
        let entities = tokio::select! {
            _ = shutdown_token.cancelled() => return Ok(()),
            entities = self.setup_until_ready() => match entities {
                Ok(entities) => entities,
                Err(SetupError::Shutdown) => return Ok(()),
                Err(e) => return Err(e),
            },
        };

        let publisher_token = shutdown_token.child_token();
        let polling = async {
            let result = self.coordinator.run().await;
            publisher_token.cancel();
            result
        };
        let (result, ()) = tokio::join!(polling, self.publish_task(&entities, &publisher_token));
        result.map_err(SetupError::from)
    }

    async fn setup_until_ready(&self) -> Result<Vec<Box<dyn Entity>>, SetupError> {
        loop {
            match self.setup().await {
                Err(SetupError::NotReady(reason)) => {
                    log::warn!(
                        "{} not ready, retrying in {}: {reason}",
                        self.device.name(),
                        humantime::format_duration(self.setup_retry_interval)
                    );
                    tokio::time::sleep(self.setup_retry_interval).await;
                }
                Err(e) => {
                    log::error!("{} setup failed: {e}", self.device.name());
                    return Err(e);
                }
                Ok(entities) => return Ok(entities),
            }
        }
    }

    /// Publish all entities, then every change of the coordinator state.
    /// A final publish happens once polling stops so that Home Assistant sees the last state.
    async fn publish_task(&self, entities: &[Box<dyn Entity>], stop: &CancellationToken) {
        let mut rx = self.coordinator.subscribe();
        let mut published = HashMap::new();
        self.publish_all(entities, &mut published).await;

        loop {
            tokio::select! {
                _ = stop.cancelled() => break,
                changed = rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    self.publish_all(entities, &mut published).await;
                }
            }
        }
        self.publish_all(entities, &mut published).await;
    }

    /// Publish the rendered state of each entity, skipping those already published unchanged.
    /// Failed entities are retried on the next call.
    pub async fn publish_all(
        &self,
        entities: &[Box<dyn Entity>],
        published: &mut HashMap<String, StateCreateOrUpdate>,
    ) {
        let snapshot = self.coordinator.get_snapshot();
        for entity in entities {
            let state = render(entity.as_ref(), &snapshot);
            if published.get(entity.entity_id()) == Some(&state) {
                continue;
            }
            match self
                .homeassistant
                .set_entity_state(entity.entity_id(), &state)
                .await
            {
                Ok(()) => {
                    published.insert(entity.entity_id().to_string(), state);
                }
                Err(e) => log::error!("Error publishing {}: {e}", entity.entity_id()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(UpdateError::AuthFailed("bad".into()), SetupError::AuthFailed("bad".into()))]
    #[case(UpdateError::Shutdown, SetupError::Shutdown)]
    #[case(
        UpdateError::Failed("timeout".into()),
        SetupError::NotReady("Error communicating with gateway: timeout".into())
    )]
    fn test_setup_error_from_update_error(#[case] err: UpdateError, #[case] expected: SetupError) {
        assert_eq!(SetupError::from(err), expected);
    }
}
