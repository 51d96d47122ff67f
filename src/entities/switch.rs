//! Switch entities: smart circuits, grid connection and generator.
use serde_json::Value;

use super::{Device, Entity, on_off};
use crate::integration::franklinwh::{Gateway, GridStatus};
use crate::services::{ControlError, GatewayControl, GatewayData};

/// One of the three smart circuit switches.
pub struct SmartSwitch {
    index: usize,
    entity_id: String,
    friendly_name: String,
}

impl SmartSwitch {
    /// `index` is 0-based, the entity is named after `index + 1`.
    pub fn new(device: &Device, index: usize) -> Self {
        let number = index + 1;
        SmartSwitch {
            index,
            entity_id: device.entity_id("switch", &format!("switch_{number}")),
            friendly_name: device.friendly_name(&format!("Switch {number}")),
        }
    }

    /// The three smart circuit switches of a gateway.
    pub fn all(device: &Device) -> Vec<SmartSwitch> {
        (0..3).map(|index| SmartSwitch::new(device, index)).collect()
    }

    pub async fn turn_on<G: Gateway>(
        &self,
        control: &GatewayControl<G>,
    ) -> Result<(), ControlError> {
        control.set_smart_switch(self.index, true).await
    }

    pub async fn turn_off<G: Gateway>(
        &self,
        control: &GatewayControl<G>,
    ) -> Result<(), ControlError> {
        control.set_smart_switch(self.index, false).await
    }

    fn is_on(&self, data: &GatewayData) -> Option<bool> {
        data.switch_state.and_then(|switches| switches.get(self.index))
    }
}

impl Entity for SmartSwitch {
    fn entity_id(&self) -> &str {
        &self.entity_id
    }

    fn friendly_name(&self) -> &str {
        &self.friendly_name
    }

    fn available(&self, data: &GatewayData) -> bool {
        data.switch_state.is_some()
    }

    fn state(&self, data: &GatewayData) -> Option<String> {
        self.is_on(data).map(on_off)
    }

    fn attributes(&self, data: Option<&GatewayData>) -> Vec<(&'static str, Value)> {
        let icon = match data.and_then(|d| self.is_on(d)) {
            Some(true) => "mdi:electric-switch-closed",
            _ => "mdi:electric-switch",
        };
        vec![("icon", Value::from(icon))]
    }
}

/// Connection of the home to the grid.
pub struct GridSwitch {
    entity_id: String,
    friendly_name: String,
}

impl GridSwitch {
    pub fn new(device: &Device) -> Self {
        GridSwitch {
            entity_id: device.entity_id("switch", "grid_switch"),
            friendly_name: device.friendly_name("Grid Connection"),
        }
    }

    pub async fn turn_on<G: Gateway>(
        &self,
        control: &GatewayControl<G>,
    ) -> Result<(), ControlError> {
        control.set_grid_connection(true).await
    }

    pub async fn turn_off<G: Gateway>(
        &self,
        control: &GatewayControl<G>,
    ) -> Result<(), ControlError> {
        control.set_grid_connection(false).await
    }

    fn is_on(data: &GatewayData) -> Option<bool> {
        match data.stats.current.grid_status? {
            GridStatus::Normal => Some(true),
            GridStatus::Off => Some(false),
            GridStatus::Down => None,
        }
    }
}

impl Entity for GridSwitch {
    fn entity_id(&self) -> &str {
        &self.entity_id
    }

    fn friendly_name(&self) -> &str {
        &self.friendly_name
    }

    fn available(&self, data: &GatewayData) -> bool {
        data.stats.current.grid_status.is_some()
    }

    fn state(&self, data: &GatewayData) -> Option<String> {
        Self::is_on(data).map(on_off)
    }

    fn attributes(&self, data: Option<&GatewayData>) -> Vec<(&'static str, Value)> {
        let icon = match data.and_then(Self::is_on) {
            Some(true) => "mdi:transmission-tower",
            _ => "mdi:transmission-tower-off",
        };
        vec![("icon", Value::from(icon))]
    }
}

/// Generator module, only present when one is attached.
pub struct GeneratorSwitch {
    entity_id: String,
    friendly_name: String,
}

impl GeneratorSwitch {
    pub fn new(device: &Device) -> Self {
        GeneratorSwitch {
            entity_id: device.entity_id("switch", "generator"),
            friendly_name: device.friendly_name("Generator"),
        }
    }

    pub async fn turn_on<G: Gateway>(
        &self,
        control: &GatewayControl<G>,
    ) -> Result<(), ControlError> {
        control.set_generator(true).await
    }

    pub async fn turn_off<G: Gateway>(
        &self,
        control: &GatewayControl<G>,
    ) -> Result<(), ControlError> {
        control.set_generator(false).await
    }
}

impl Entity for GeneratorSwitch {
    fn entity_id(&self) -> &str {
        &self.entity_id
    }

    fn friendly_name(&self) -> &str {
        &self.friendly_name
    }

    fn available(&self, data: &GatewayData) -> bool {
        data.stats.current.generator_enabled.is_some()
    }

    fn state(&self, data: &GatewayData) -> Option<String> {
        data.stats.current.generator_enabled.map(on_off)
    }

    fn attributes(&self, _data: Option<&GatewayData>) -> Vec<(&'static str, Value)> {
        vec![("icon", Value::from("mdi:generator-stationary"))]
    }
}
