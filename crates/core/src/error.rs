//! Error taxonomy shared by the session, cache, and data layers.

use thiserror::Error;

/// Result type used across the client core.
pub type DataResult<T> = Result<T, DataError>;

/// Failure of a provider or remote-store call.
///
/// Every async boundary in this workspace resolves to an explicit
/// `DataResult`; nothing panics into caller code paths. Cloneable so that
/// collapsed concurrent reads can all observe the same settled error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DataError {
    /// Authentication failure (bad credentials, expired session).
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Requested row is absent.
    ///
    /// Callers that treat absence as a valid empty state (a not-yet-created
    /// profile) must map this to `Ok(None)` instead of surfacing it.
    #[error("not found")]
    NotFound,

    /// Row-level policy denied the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Network failure or timeout; retryable.
    #[error("transient failure: {0}")]
    Transient(String),

    /// Malformed payload rejected before or by the backend.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Anything the backend reported that fits no other variant.
    #[error("unexpected failure: {0}")]
    Unknown(String),
}

impl DataError {
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn transient(msg: impl Into<String>) -> Self {
        Self::Transient(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unknown(msg: impl Into<String>) -> Self {
        Self::Unknown(msg.into())
    }

    /// Whether retrying the same call may succeed without intervention.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}
