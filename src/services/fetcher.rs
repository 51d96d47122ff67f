//! Gateway data fetcher.
//! Gathers the enabled parts of [`GatewayData`] from the gateway in one cycle.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use strum_macros::Display;

use crate::coordinator::Fetch;
use crate::integration::franklinwh::{self, Gateway, ModeState, Stats, SwitchState};

/// Data fetched from the gateway in a single cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GatewayData {
    pub stats: Stats,
    pub switch_state: Option<SwitchState>,
    pub mode: Option<ModeState>,
}

/// Optional parts of [`GatewayData`], fetched only when enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum DataPart {
    #[strum(serialize = "switch_state")]
    SwitchState,
    #[strum(serialize = "mode")]
    Mode,
}

pub struct GatewayFetcher<G> {
    gateway: Arc<G>,
    switch_state: AtomicBool,
    mode: AtomicBool,
}

impl<G: Gateway> GatewayFetcher<G> {
    /// Creates a fetcher producing stats only.
    pub fn new(gateway: Arc<G>) -> Self {
        GatewayFetcher {
            gateway,
            switch_state: AtomicBool::new(false),
            mode: AtomicBool::new(false),
        }
    }

    pub fn gateway(&self) -> &Arc<G> {
        &self.gateway
    }

    /// Produce `part` on every following fetch.
    pub fn enable(&self, part: DataPart) {
        if !self.flag(part).swap(true, Ordering::AcqRel) {
            log::debug!("Enabled fetching of {part}");
        }
    }

    pub fn is_enabled(&self, part: DataPart) -> bool {
        self.flag(part).load(Ordering::Acquire)
    }

    fn flag(&self, part: DataPart) -> &AtomicBool {
        match part {
            DataPart::SwitchState => &self.switch_state,
            DataPart::Mode => &self.mode,
        }
    }
}

impl<G: Gateway> Fetch for GatewayFetcher<G> {
    type Output = GatewayData;
    type Error = franklinwh::Error;

    async fn fetch(&self) -> franklinwh::Result<GatewayData> {
        let with_switch_state = self.is_enabled(DataPart::SwitchState);
        let with_mode = self.is_enabled(DataPart::Mode);

        let (stats, switch_state, mode) = tokio::try_join!(
            self.gateway.get_stats(),
            async {
                if with_switch_state {
                    self.gateway.get_smart_switch_state().await.map(Some)
                } else {
                    Ok(None)
                }
            },
            async {
                if with_mode {
                    self.gateway.get_mode().await.map(Some)
                } else {
                    Ok(None)
                }
            },
        )?;

        Ok(GatewayData {
            stats,
            switch_state,
            mode,
        })
    }
}
