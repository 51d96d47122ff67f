//! Entity projections.
//! Stateless views turning the coordinator snapshot into Home Assistant states.
mod number;
mod select;
mod sensor;
mod switch;

use serde_json::Value;

use crate::coordinator::Snapshot;
use crate::integration::homeassistant::StateCreateOrUpdate;
use crate::services::GatewayData;

pub use number::BackupReserve;
pub use select::ModeSelect;
pub use sensor::{SENSORS, Sensor, SensorDescription};
pub use switch::{GeneratorSwitch, GridSwitch, SmartSwitch};

pub const STATE_UNAVAILABLE: &str = "unavailable";
pub const STATE_UNKNOWN: &str = "unknown";
pub const STATE_ON: &str = "on";
pub const STATE_OFF: &str = "off";

/// The gateway as presented in Home Assistant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    gateway_id: String,
}

impl Device {
    pub fn new(gateway_id: impl Into<String>) -> Self {
        Device {
            gateway_id: gateway_id.into(),
        }
    }

    pub fn gateway_id(&self) -> &str {
        &self.gateway_id
    }

    /// Last six characters of the gateway id.
    pub fn short_id(&self) -> String {
        let chars: Vec<char> = self.gateway_id.chars().collect();
        chars[chars.len().saturating_sub(6)..].iter().collect()
    }

    /// Device name, e.g. `FranklinWH 00A1B2`.
    pub fn name(&self) -> String {
        format!("FranklinWH {}", self.short_id())
    }

    /// Entity id for `key` in `domain`, e.g. `sensor.franklinwh_00a1b2_battery_soc`.
    pub fn entity_id(&self, domain: &str, key: &str) -> String {
        format!(
            "{domain}.franklinwh_{}_{key}",
            self.short_id().to_lowercase()
        )
    }

    /// Friendly name for an entity of this device.
    pub fn friendly_name(&self, name: &str) -> String {
        format!("{} {name}", self.name())
    }
}

pub trait Entity: Send + Sync {
    fn entity_id(&self) -> &str;

    fn friendly_name(&self) -> &str;

    /// Returns `false` when the data this entity projects is missing.
    fn available(&self, _data: &GatewayData) -> bool {
        true
    }

    /// Current state, `None` when the gateway reports an unknown value.
    fn state(&self, data: &GatewayData) -> Option<String>;

    /// Attributes besides the friendly name. `data` is `None` while unavailable.
    fn attributes(&self, data: Option<&GatewayData>) -> Vec<(&'static str, Value)>;
}

/// Render the Home Assistant state of `entity` for the given snapshot.
/// Everything is unavailable while the coordinator data is unusable.
pub fn render(entity: &dyn Entity, snapshot: &Snapshot<GatewayData>) -> StateCreateOrUpdate {
    let data = snapshot
        .data
        .as_deref()
        .filter(|data| snapshot.is_usable() && entity.available(data));

    let state = match data {
        Some(data) => entity
            .state(data)
            .unwrap_or_else(|| STATE_UNKNOWN.to_string()),
        None => STATE_UNAVAILABLE.to_string(),
    };

    let mut attributes: serde_json::Map<String, Value> = entity
        .attributes(data)
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect();
    attributes.insert(
        "friendly_name".to_string(),
        Value::String(entity.friendly_name().to_string()),
    );

    StateCreateOrUpdate { state, attributes }
}

fn on_off(value: bool) -> String {
    let state = if value { STATE_ON } else { STATE_OFF };
    state.to_string()
}
