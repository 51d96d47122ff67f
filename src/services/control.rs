//! Gateway control.
//! Commands go straight to the gateway and their errors are returned as is.
//! After a successful command the coordinator is refreshed to pick up the new state.
use std::sync::Arc;
use std::time::Duration;

use super::fetcher::GatewayFetcher;
use crate::coordinator::PollingCoordinator;
use crate::integration::franklinwh::{self, Gateway, GridStatus, Mode, SwitchCommand};

#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("Gateway command failed: {0}")]
    Gateway(#[from] franklinwh::Error),
    #[error("Invalid switch index: {0}")]
    InvalidSwitch(usize),
    #[error("Invalid mode: {0}")]
    InvalidMode(String),
    #[error("Backup reserve out of range: {0}")]
    ReserveOutOfRange(f64),
}

pub struct GatewayControl<G: Gateway> {
    coordinator: Arc<PollingCoordinator<GatewayFetcher<G>>>,
    settle_delay: Duration,
}

impl<G: Gateway> GatewayControl<G> {
    /// Creates a new instance of `GatewayControl`.
    /// `settle_delay` is waited after each command before refreshing.
    pub fn new(
        coordinator: Arc<PollingCoordinator<GatewayFetcher<G>>>,
        settle_delay: Duration,
    ) -> Self {
        GatewayControl {
            coordinator,
            settle_delay,
        }
    }

    fn gateway(&self) -> &G {
        self.coordinator.fetcher().gateway()
    }

    /// Turn smart circuit switch `index` (0-based) on or off.
    pub async fn set_smart_switch(&self, index: usize, on: bool) -> Result<(), ControlError> {
        let command = SwitchCommand::single(index, on).ok_or(ControlError::InvalidSwitch(index))?;
        self.gateway()
            .set_smart_switch_state(command)
            .await
            .inspect_err(|e| log::error!("Failed to set switch {}: {e}", index + 1))?;
        log::info!("Switch {} turned {}", index + 1, if on { "on" } else { "off" });
        self.settle_and_refresh().await;
        Ok(())
    }

    /// Connect to or disconnect from the grid.
    pub async fn set_grid_connection(&self, on: bool) -> Result<(), ControlError> {
        let status = if on { GridStatus::Normal } else { GridStatus::Off };
        self.gateway()
            .set_grid_status(status)
            .await
            .inspect_err(|e| log::error!("Failed to set grid status to {status}: {e}"))?;
        log::info!("Grid status set to {status}");
        self.settle_and_refresh().await;
        Ok(())
    }

    /// Enable or disable the generator.
    pub async fn set_generator(&self, on: bool) -> Result<(), ControlError> {
        self.gateway()
            .set_generator(on)
            .await
            .inspect_err(|e| log::error!("Failed to switch generator: {e}"))?;
        log::info!("Generator turned {}", if on { "on" } else { "off" });
        self.settle_and_refresh().await;
        Ok(())
    }

    /// Change the operating mode, optionally together with the backup reserve (0-100 %).
    pub async fn set_mode(&self, mode: Mode, reserve_soc: Option<u8>) -> Result<(), ControlError> {
        if !mode.is_selectable() {
            return Err(ControlError::InvalidMode(mode.to_string()));
        }
        if let Some(soc) = reserve_soc.filter(|soc| *soc > 100) {
            return Err(ControlError::ReserveOutOfRange(f64::from(soc)));
        }
        self.gateway()
            .set_mode(mode, reserve_soc)
            .await
            .inspect_err(|e| log::error!("Failed to set mode to '{mode}': {e}"))?;
        log::info!("Mode set to '{mode}'");
        self.settle_and_refresh().await;
        Ok(())
    }

    /// Change the backup reserve of the current mode.
    pub async fn set_backup_reserve(&self, percent: u8) -> Result<(), ControlError> {
        let known_mode = self
            .coordinator
            .get_snapshot()
            .data
            .and_then(|data| data.mode)
            .map(|state| state.mode);
        let mode = match known_mode {
            Some(mode) => mode,
            None => self.gateway().get_mode().await?.mode,
        };
        self.set_mode(mode, Some(percent)).await
    }

    /// Let the gateway apply the command, then refresh the coordinator.
    async fn settle_and_refresh(&self) {
        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }
        if let Err(e) = self.coordinator.refresh_now().await {
            log::warn!("Refresh after command failed: {e}");
        }
    }
}
