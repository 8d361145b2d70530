//! Error types for the Telegram bot.

use qbit_core::{ConfigError, FetchError};
use thiserror::Error;

/// Errors that can stop the bot.
#[derive(Debug, Error)]
pub enum BotError {
    /// Configuration is missing or malformed.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The torrent client could not be reached at startup.
    #[error("qBittorrent error: {0}")]
    Torrent(#[from] FetchError),

    /// Failed to start the bot.
    #[error("Failed to start bot: {0}")]
    BotStartFailed(String),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for bot operations.
pub type Result<T> = std::result::Result<T, BotError>;

impl From<teloxide::RequestError> for BotError {
    fn from(e: teloxide::RequestError) -> Self {
        BotError::BotStartFailed(e.to_string())
    }
}
