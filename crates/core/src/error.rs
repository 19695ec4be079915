//! Error types shared by every gaccount crate.

use thiserror::Error;

/// Top-level error type for all account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    /// Malformed input. Raised locally; the directory is never contacted.
    #[error("validation error: {0}")]
    Validation(String),

    /// The operation was invoked in the wrong state (e.g. create-when-exists).
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// The directory rejected the operation because the target already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Any other failure returned by the directory service.
    #[error("directory error ({status}): {message}")]
    Remote { status: u16, message: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("authentication error: {0}")]
    Auth(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl AccountError {
    /// Build a [`AccountError::Remote`] from an HTTP status code and response body.
    pub fn remote(status: u16, message: impl Into<String>) -> Self {
        Self::Remote {
            status,
            message: message.into(),
        }
    }
}

/// A convenience Result alias that defaults to [`AccountError`].
pub type Result<T> = std::result::Result<T, AccountError>;
