//! Backup reserve number entity.
use serde_json::Value;

use super::{Device, Entity};
use crate::integration::franklinwh::Gateway;
use crate::services::{ControlError, GatewayControl, GatewayData};

pub struct BackupReserve {
    entity_id: String,
    friendly_name: String,
}

impl BackupReserve {
    pub const MIN: u8 = 5;
    pub const MAX: u8 = 100;
    pub const STEP: u8 = 1;

    pub fn new(device: &Device) -> Self {
        BackupReserve {
            entity_id: device.entity_id("number", "backup_reserve"),
            friendly_name: device.friendly_name("Backup Reserve"),
        }
    }

    /// Set the backup reserve percentage, keeping the current mode.
    pub async fn set_native_value<G: Gateway>(
        &self,
        control: &GatewayControl<G>,
        value: f64,
    ) -> Result<(), ControlError> {
        let percent = value.round();
        if !percent.is_finite() || percent < f64::from(Self::MIN) || percent > f64::from(Self::MAX)
        {
            return Err(ControlError::ReserveOutOfRange(value));
        }
        control.set_backup_reserve(percent as u8).await
    }

    fn icon(value: Option<u8>) -> String {
        match value {
            None => "mdi:battery-alert".to_string(),
            Some(v) if v >= 99 => "mdi:battery".to_string(),
            Some(v) if v < 10 => "mdi:battery-outline".to_string(),
            Some(v) => format!("mdi:battery-{}", v / 10 * 10),
        }
    }
}

impl Entity for BackupReserve {
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
        data.mode.map(|m| m.reserve_soc.to_string())
    }

    fn attributes(&self, data: Option<&GatewayData>) -> Vec<(&'static str, Value)> {
        let value = data.and_then(|d| d.mode).map(|m| m.reserve_soc);
        vec![
            ("min", Value::from(Self::MIN)),
            ("max", Value::from(Self::MAX)),
            ("step", Value::from(Self::STEP)),
            ("unit_of_measurement", Value::from("%")),
            ("icon", Value::from(Self::icon(value))),
        ]
    }
}
