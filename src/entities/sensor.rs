//! Sensor entities: battery, power flows and daily energy totals.
use serde_json::Value;

use super::{Device, Entity};
use crate::integration::franklinwh::Stats;
use crate::services::GatewayData;

/// Static description of one sensor.
#[derive(Debug, Clone, Copy)]
pub struct SensorDescription {
    pub key: &'static str,
    pub name: &'static str,
    pub unit: &'static str,
    pub device_class: &'static str,
    pub state_class: &'static str,
    pub value: fn(&Stats) -> f64,
}

const fn power(
    key: &'static str,
    name: &'static str,
    value: fn(&Stats) -> f64,
) -> SensorDescription {
    SensorDescription {
        key,
        name,
        unit: "kW",
        device_class: "power",
        state_class: "measurement",
        value,
    }
}

const fn energy(
    key: &'static str,
    name: &'static str,
    value: fn(&Stats) -> f64,
) -> SensorDescription {
    SensorDescription {
        key,
        name,
        unit: "kWh",
        device_class: "energy",
        state_class: "total_increasing",
        value,
    }
}

pub const SENSORS: &[SensorDescription] = &[
    SensorDescription {
        key: "battery_soc",
        name: "State of Charge",
        unit: "%",
        device_class: "battery",
        state_class: "measurement",
        value: |s| s.current.battery_soc,
    },
    power("battery_use", "Battery Use", |s| s.current.battery_use),
    power("home_load", "Home Load", |s| s.current.home_load),
    power("grid_use", "Grid Use", |s| s.current.grid_use),
    power("solar_production", "Solar Production", |s| s.current.solar_production),
    power("generator_production", "Generator Production", |s| s.current.generator_production),
    power("switch_1_load", "Switch 1 Load", |s| s.current.switch_1_load),
    power("switch_2_load", "Switch 2 Load", |s| s.current.switch_2_load),
    power("v2l_use", "V2L Use", |s| s.current.v2l_use),
    energy("battery_charge", "Battery Charge", |s| s.totals.battery_charge),
    energy("battery_discharge", "Battery Discharge", |s| s.totals.battery_discharge),
    energy("grid_import", "Grid Import", |s| s.totals.grid_import),
    energy("grid_export", "Grid Export", |s| s.totals.grid_export),
    energy("solar", "Solar Energy", |s| s.totals.solar),
    energy("generator", "Generator Energy", |s| s.totals.generator),
    energy("switch_1_use", "Switch 1 Use", |s| s.totals.switch_1_use),
    energy("switch_2_use", "Switch 2 Use", |s| s.totals.switch_2_use),
    energy("v2l_export", "V2L Export", |s| s.totals.v2l_export),
    energy("v2l_import", "V2L Import", |s| s.totals.v2l_import),
];

pub struct Sensor {
    description: SensorDescription,
    entity_id: String,
    friendly_name: String,
}

impl Sensor {
    pub fn new(device: &Device, description: SensorDescription) -> Self {
        Sensor {
            entity_id: device.entity_id("sensor", description.key),
            friendly_name: device.friendly_name(description.name),
            description,
        }
    }

    /// All sensors of a gateway.
    pub fn all(device: &Device) -> Vec<Sensor> {
        SENSORS.iter().map(|d| Sensor::new(device, *d)).collect()
    }

    pub fn description(&self) -> &SensorDescription {
        &self.description
    }
}

impl Entity for Sensor {
    fn entity_id(&self) -> &str {
        &self.entity_id
    }

    fn friendly_name(&self) -> &str {
        &self.friendly_name
    }

    fn state(&self, data: &GatewayData) -> Option<String> {
        let value = (self.description.value)(&data.stats);
        value.is_finite().then(|| value.to_string())
    }

    fn attributes(&self, _data: Option<&GatewayData>) -> Vec<(&'static str, Value)> {
        vec![
            ("unit_of_measurement", Value::from(self.description.unit)),
            ("device_class", Value::from(self.description.device_class)),
            ("state_class", Value::from(self.description.state_class)),
        ]
    }
}
