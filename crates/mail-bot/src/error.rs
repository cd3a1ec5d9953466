//! Error types for the mail bot.

use thiserror::Error;

/// Errors that can occur while serving a Telegram user.
#[derive(Debug, Error)]
pub enum BotError {
    /// Storage failed.
    #[error("database error: {0}")]
    Database(#[from] database::DatabaseError),

    /// The Bot API call failed.
    #[error("telegram error: {0}")]
    Telegram(#[from] telegram_client::TelegramError),

    /// The update stream ended unexpectedly.
    #[error("update stream ended")]
    StreamEnded,
}

/// Result type for bot operations.
pub type Result<T> = std::result::Result<T, BotError>;
