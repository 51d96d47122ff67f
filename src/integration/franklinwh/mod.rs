//! FranklinWH Integration Module
//! Typed view over the vendor gateway client.
mod error;
mod gateway;
mod schemas;

pub use error::{Error, Result};
pub use gateway::Gateway;
pub use schemas::{
    Accessory, AccessoryType, CurrentStats, GridStatus, Mode, ModeState, Stats, SwitchCommand,
    SwitchState, TotalStats,
};
