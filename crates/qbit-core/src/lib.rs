//! qbit-status core - everything between the torrent client and the chat.
//!
//! - **config**: state directory layout and environment configuration
//! - **controller**: the status refresh state machine
//! - **fetcher**: torrent snapshots, normalized for display
//! - **filter**: category aliases, filtering and sorting
//! - **format**: entry rendering, pagination and fixed replies
//! - **qbittorrent**: qBittorrent Web API client

pub mod config;
pub mod controller;
pub mod error;
pub mod fetcher;
pub mod filter;
pub mod format;
pub mod qbittorrent;

// Re-export commonly used items for convenience
pub use config::{BotConfig, QbitConfig};
pub use controller::{
    Affordance, BotCommand, BotEvent, ChatSink, ControllerSettings, PublishedStatus, RefreshState,
    StatusController, StatusRequest, PAUSE_KEY, RESUME_KEY,
};
pub use error::{ChatError, ChatResult, ConfigError, FetchError, FetchResult};
pub use fetcher::{SnapshotFetcher, TorrentSource};
pub use filter::CategoryAliases;
pub use qbittorrent::QbitClient;
