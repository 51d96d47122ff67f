//! FranklinWH gateway operations.
//! The vendor client (cloud or local API, authentication, token refresh) lives
//! outside this crate and is plugged in by implementing [`Gateway`].
use std::future::Future;

use super::Result;
use super::schemas::{Accessory, GridStatus, Mode, ModeState, Stats, SwitchCommand, SwitchState};

pub trait Gateway: Send + Sync + 'static {
    /// Identifier of the gateway (aGate serial number).
    fn gateway_id(&self) -> &str;

    /// Get current measurements and daily totals.
    fn get_stats(&self) -> impl Future<Output = Result<Stats>> + Send;

    /// Get the smart circuit switch positions.
    fn get_smart_switch_state(&self) -> impl Future<Output = Result<SwitchState>> + Send;

    /// Change one or more smart circuit switches.
    fn set_smart_switch_state(
        &self,
        command: SwitchCommand,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Connect to (`Normal`) or disconnect from (`Off`) the grid.
    fn set_grid_status(&self, status: GridStatus) -> impl Future<Output = Result<()>> + Send;

    /// Get the operating mode and its backup reserve.
    fn get_mode(&self) -> impl Future<Output = Result<ModeState>> + Send;

    /// Change the operating mode, optionally with a new backup reserve percentage.
    fn set_mode(
        &self,
        mode: Mode,
        reserve_soc: Option<u8>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Enable or disable the generator.
    fn set_generator(&self, enabled: bool) -> impl Future<Output = Result<()>> + Send;

    /// List the accessories attached to the gateway.
    fn get_accessories(&self) -> impl Future<Output = Result<Vec<Accessory>>> + Send;
}
