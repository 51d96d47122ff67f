//! Operating mode select entity.
use std::str::FromStr;

use serde_json::Value;
use strum::IntoEnumIterator;

use super::{Device, Entity};
use crate::integration::franklinwh::{Gateway, Mode};
use crate::services::{ControlError, GatewayControl, GatewayData};

pub struct ModeSelect {
    entity_id: String,
    friendly_name: String,
}

impl ModeSelect {
    pub fn new(device: &Device) -> Self {
        ModeSelect {
            entity_id: device.entity_id("select", "mode"),
            friendly_name: device.friendly_name("Operating Mode"),
        }
    }

    /// Names of all modes the gateway can report.
    pub fn options() -> Vec<String> {
        Mode::iter().map(|mode| mode.to_string()).collect()
    }

    /// Switch to the mode named `option`, keeping the current backup reserve.
    pub async fn select_option<G: Gateway>(
        &self,
        control: &GatewayControl<G>,
        option: &str,
    ) -> Result<(), ControlError> {
        let mode =
            Mode::from_str(option).map_err(|_| ControlError::InvalidMode(option.to_string()))?;
        control.set_mode(mode, None).await
    }

    fn icon(mode: Option<Mode>) -> &'static str {
        match mode {
            Some(Mode::TimeOfUse) => "mdi:battery-clock",
            Some(Mode::SelfConsumption) => "mdi:battery-arrow-down",
            Some(Mode::EmergencyBackup) => "mdi:battery-arrow-up",
            Some(Mode::Vpp) => "mdi:battery-heart",
            None => "mdi:battery-alert",
        }
    }
}

impl Entity for ModeSelect {
    fn entity_id(&self) -> &str {
        &self.entity_id
    }

    fn friendly_name(&self) -> &str {
        &self.friendly_name
    }

    fn available(&self, data: &GatewayData) -> bool {
        data.mode.is_some()
    }

    fn state(&self, data: &GatewayData) -> Option<String> {
        data.mode.map(|m| m.mode.to_string())
    }

    fn attributes(&self, data: Option<&GatewayData>) -> Vec<(&'static str, Value)> {
        let mode = data.and_then(|d| d.mode).map(|m| m.mode);
        vec![
            ("options", Value::from(Self::options())),
            ("icon", Value::from(Self::icon(mode))),
        ]
    }
}
