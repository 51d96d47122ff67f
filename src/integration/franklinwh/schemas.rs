//! FranklinWH data records.
//! Power values are in kilowatts (kW), energy totals in kilowatt-hours (kWh).
use serde::Serialize;
use strum_macros::{Display, EnumIter, EnumString};

/// Instantaneous measurements reported by the gateway.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CurrentStats {
    pub battery_soc: f64,
    pub battery_use: f64,
    pub home_load: f64,
    pub grid_use: f64,
    pub solar_production: f64,
    pub generator_production: f64,
    pub switch_1_load: f64,
    pub switch_2_load: f64,
    pub v2l_use: f64,
    pub grid_status: Option<GridStatus>,
    pub generator_enabled: Option<bool>,
}

/// Cumulative energy totals for the current day.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TotalStats {
    pub battery_charge: f64,
    pub battery_discharge: f64,
    pub grid_import: f64,
    pub grid_export: f64,
    pub solar: f64,
    pub generator: f64,
    pub switch_1_use: f64,
    pub switch_2_use: f64,
    pub v2l_export: f64,
    pub v2l_import: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Stats {
    pub current: CurrentStats,
    pub totals: TotalStats,
}

/// Grid connection status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, EnumString, Display)]
pub enum GridStatus {
    #[strum(serialize = "Normal")]
    Normal,
    #[strum(serialize = "Down")]
    Down,
    #[strum(serialize = "Off")]
    Off,
}

/// Position of the three smart circuit switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SwitchState(pub [bool; 3]);

impl SwitchState {
    /// Returns the position of switch `index` (0-based), `None` when out of range.
    pub fn get(&self, index: usize) -> Option<bool> {
        self.0.get(index).copied()
    }
}

/// Command for the smart circuit switches, `None` leaves a switch untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwitchCommand(pub [Option<bool>; 3]);

impl SwitchCommand {
    /// Command changing only switch `index` (0-based).
    pub fn single(index: usize, on: bool) -> Option<Self> {
        let mut switches = [None; 3];
        *switches.get_mut(index)? = Some(on);
        Some(SwitchCommand(switches))
    }
}

/// Gateway operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumString, Display, EnumIter)]
pub enum Mode {
    #[strum(serialize = "Time of Use")]
    TimeOfUse,
    #[strum(serialize = "Self Consumption")]
    SelfConsumption,
    #[strum(serialize = "Emergency Backup")]
    EmergencyBackup,
    #[strum(serialize = "VPP")]
    Vpp,
}

impl Mode {
    /// Returns `true` if the mode can be requested by the user.
    /// VPP is imposed by the utility program and only ever reported.
    pub fn is_selectable(&self) -> bool {
        !matches!(self, Mode::Vpp)
    }
}

/// Operating mode together with its backup reserve (state of charge kept for outages).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModeState {
    pub mode: Mode,
    pub reserve_soc: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AccessoryType {
    SmartCircuitModule,
    GeneratorModule,
    Other(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Accessory {
    pub accessory_type: AccessoryType,
    pub serial: Option<String>,
}
