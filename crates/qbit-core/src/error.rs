//! Error types for the refresh core.

use thiserror::Error;

/// Errors raised while talking to the torrent client.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The client rejected the configured credentials.
    #[error("qBittorrent login rejected: {0}")]
    LoginRejected(String),

    /// The client answered with a non-success HTTP status.
    #[error("qBittorrent returned HTTP {status} for {endpoint}")]
    Status {
        /// Request path that failed.
        endpoint: &'static str,
        /// HTTP status code.
        status: u16,
    },

    /// Transport-level failure (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(String),

    /// The response body could not be decoded.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// The configured host is not a valid URL.
    #[error("Invalid qBittorrent URL: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            FetchError::Parse(e.to_string())
        } else {
            FetchError::Http(e.to_string())
        }
    }
}

/// Errors raised by the chat platform while publishing.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The platform rejected or failed a request.
    #[error("chat request failed: {0}")]
    Request(String),

    /// The referenced message no longer exists.
    #[error("message not found: {0}")]
    MessageNotFound(i32),
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("{0} not set. Add it to the environment or the .env file.")]
    Missing(&'static str),

    /// A variable is set but cannot be parsed.
    #[error("invalid value for {var}: {value}")]
    Invalid {
        /// Variable name.
        var: &'static str,
        /// Offending value.
        value: String,
    },
}

/// Result type for torrent-client operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type for chat operations.
pub type ChatResult<T> = std::result::Result<T, ChatError>;
