//! Error types for lily-core

use thiserror::Error;

use crate::remote::RemoteError;

/// Result type alias using lily-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in lily-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Remote service could not be reached (network, timeout, 5xx)
    #[error("Remote service unavailable: {0}")]
    RemoteUnavailable(String),

    /// Remote service refused the request (4xx)
    #[error("Remote service rejected the request ({status}): {message}")]
    RemoteRejected { status: u16, message: String },

    /// Local storage failure; the store is unusable for this operation
    #[error("Local storage error: {0}")]
    LocalStorage(String),

    /// Record absent both remotely and locally
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether the error means local persistence can no longer be trusted.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::LocalStorage(_) | Self::Io(_))
    }
}

impl From<libsql::Error> for Error {
    fn from(error: libsql::Error) -> Self {
        Self::LocalStorage(error.to_string())
    }
}

impl From<RemoteError> for Error {
    fn from(error: RemoteError) -> Self {
        match error {
            RemoteError::Unavailable(message) => Self::RemoteUnavailable(message),
            RemoteError::Rejected { status, message } => Self::RemoteRejected { status, message },
        }
    }
}
