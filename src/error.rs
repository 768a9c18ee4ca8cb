//! Error types shared by every cache backend.

use thiserror::Error as ThisError;

/// Errors returned by cache operations and backend construction.
///
/// A missing key is never reported through this type: `get` returns an empty
/// string, `lookup` returns `None`, `exists` returns `false` and `delete`
/// succeeds.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum Error {
    /// The backend configuration or connection URL is malformed.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The initial connectivity check against the store failed.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The store or the transport failed while executing an operation.
    #[error("Backend error: {0}")]
    BackendError(String),

    /// The stored value (or a script reply) does not have the required shape,
    /// e.g. incrementing a non-numeric string or overflowing an `i64`.
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// The operation did not complete before its deadline.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// The backend was closed before the operation was issued.
    #[error("Cache backend is closed")]
    Closed,
}

impl Error {
    /// Whether the error came from the shape of the stored value rather than
    /// from the store being unavailable.
    pub fn is_invalid_value(&self) -> bool {
        matches!(self, Error::InvalidValue(_))
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
