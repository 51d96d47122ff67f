mod bridge;
mod control;
mod fetcher;

pub use bridge::{GatewayBridgeService, SetupError};
pub use control::{ControlError, GatewayControl};
pub use fetcher::{DataPart, GatewayData, GatewayFetcher};
