//! Error types for the relay.

use thiserror::Error;

/// Errors that can occur while delivering a message.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Storage failed; the sender should retry later.
    #[error("database error: {0}")]
    Database(#[from] database::DatabaseError),
}

/// Errors reported by a notification channel.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The channel could not deliver the notification.
    #[error("notification channel error: {0}")]
    Channel(String),
}

/// Result type for relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;
