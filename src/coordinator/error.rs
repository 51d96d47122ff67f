//! Error handling for the polling coordinator.

/// How a failed fetch is treated by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Credentials are invalid or expired. Not retried, the user must re-authenticate.
    Auth,
    /// Expected to clear on its own (timeout, offline gateway, network error).
    Transient,
}

/// Classification of fetch errors, matched exhaustively by the implementor.
pub trait Classify {
    fn failure_kind(&self) -> FailureKind;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpdateError {
    #[error("Authentication failed: {0}")]
    AuthFailed(String),
    #[error("Error communicating with gateway: {0}")]
    Failed(String),
    #[error("Error communicating with gateway ({failures} consecutive failures): {message}")]
    Exhausted { failures: u32, message: String },
    #[error("Coordinator is shut down")]
    Shutdown,
}

impl UpdateError {
    /// Returns `true` if the error requires the user to re-authenticate.
    pub fn is_auth_failed(&self) -> bool {
        matches!(self, UpdateError::AuthFailed(_))
    }
}
