//! Polling Coordinator Module
//! Single source of truth for the latest known remote state of one device.
mod error;
mod polling;
mod state;

pub use error::{Classify, FailureKind, UpdateError};
pub use polling::{Fetch, PollingCoordinator, Settings};
pub use state::{CoordinatorState, Health, Snapshot};
