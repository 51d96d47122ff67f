//! Error handling for the FranklinWH gateway client.

use crate::coordinator::{Classify, FailureKind};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Authentication failed: invalid credentials")]
    InvalidCredentials,
    #[error("Authentication failed: token expired")]
    TokenExpired,

    #[error("Device timeout: gateway did not answer in time")]
    DeviceTimeout,
    #[error("Gateway offline")]
    GatewayOffline,
    #[error("Account locked")]
    AccountLocked,

    #[error("Request failed: {0}")]
    RequestFailed(String),
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Classify for Error {
    fn failure_kind(&self) -> FailureKind {
        match self {
            Error::InvalidCredentials | Error::TokenExpired => FailureKind::Auth,
            // A locked account clears on its own upstream, polling keeps going.
            Error::AccountLocked => FailureKind::Transient,
            Error::DeviceTimeout
            | Error::GatewayOffline
            | Error::RequestFailed(_)
            | Error::UnexpectedResponse(_) => FailureKind::Transient,
        }
    }
}
