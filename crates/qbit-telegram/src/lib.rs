//! Telegram front-end for the qBittorrent status bot.
//!
//! Publishes a paginated download report into one designated chat and keeps
//! it fresh on a timer. The first page carries inline Pause and Resume
//! buttons that toggle auto-refresh.
//!
//! # Environment Variables
//!
//! Required:
//! - `TELEGRAM_BOT_TOKEN`: Bot token from @BotFather
//! - `BOT_CHAT_ID`: Chat the bot accepts commands in and publishes to
//! - `QBIT_HOST`: qBittorrent Web UI host or URL
//! - `QBIT_USERNAME` / `QBIT_PASSWORD`: Web UI credentials
//!
//! Optional:
//! - `QBIT_PORT`: Web UI port (default: 8080)
//! - `TV_CATEGORY`: Category behind the `tv` alias (default: tv-sonarr)
//! - `MOVIE_CATEGORY`: Category behind the `movies` alias (default: radarr)
//! - `REFRESH_INTERVAL_SECS`: Auto-refresh interval (default: 300)
//!
//! # Commands
//!
//! - `/status [category] [status]` - Publish the download report
//! - `/help` - Show available commands

pub mod bot;
pub mod error;
pub mod handlers;
pub mod sink;

pub use bot::StatusBot;
pub use error::{BotError, Result};
pub use handlers::Command;
pub use sink::TelegramSink;
