//! Configuration for qbit-status.
//!
//! Provides the state directory layout and the immutable [`BotConfig`] read
//! from the environment at startup.
//!
//! # Storage Structure
//!
//! ```text
//! ~/.qbit-status/
//! ├── config/       # .env with tokens and credentials
//! └── logs/         # bot.log
//! ```
//!
//! # Environment Variables
//!
//! - `QBIT_STATUS_DIR`: Override the base state directory
//! - `TELEGRAM_BOT_TOKEN`, `BOT_CHAT_ID`: chat platform binding (required)
//! - `QBIT_HOST`, `QBIT_USERNAME`, `QBIT_PASSWORD`: torrent client (required)
//! - `QBIT_PORT`: torrent client port (default: 8080)
//! - `TV_CATEGORY`, `MOVIE_CATEGORY`: category aliases
//! - `REFRESH_INTERVAL_SECS`: auto-refresh interval (default: 300)

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use qbit_models::ChatRef;
use url::Url;

use crate::error::{ConfigError, FetchError};
use crate::filter::CategoryAliases;

/// Environment variable for custom state directory.
pub const STATE_DIR_ENV: &str = "QBIT_STATUS_DIR";

/// Default state directory name under home.
const DEFAULT_STATE_DIR: &str = ".qbit-status";

const CONFIG_SUBDIR: &str = "config";
const LOGS_SUBDIR: &str = "logs";

/// Default category the "tv" alias resolves to.
pub const DEFAULT_TV_CATEGORY: &str = "tv-sonarr";

/// Default category the "movies" alias resolves to.
pub const DEFAULT_MOVIE_CATEGORY: &str = "radarr";

/// Default qBittorrent Web UI port.
pub const DEFAULT_QBIT_PORT: u16 = 8080;

/// Default auto-refresh interval.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(300);

/// Get the state directory.
///
/// `QBIT_STATUS_DIR` if set, otherwise `~/.qbit-status`, falling back to
/// `.qbit-status` in the current directory.
pub fn state_dir() -> PathBuf {
    std::env::var(STATE_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(DEFAULT_STATE_DIR))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR))
        })
}

/// Get the config directory.
pub fn config_dir() -> PathBuf {
    state_dir().join(CONFIG_SUBDIR)
}

/// Get the logs directory.
pub fn logs_dir() -> PathBuf {
    state_dir().join(LOGS_SUBDIR)
}

/// Get the .env file path holding tokens and credentials.
pub fn env_file() -> PathBuf {
    config_dir().join(".env")
}

/// Get the log file path.
pub fn log_file() -> PathBuf {
    logs_dir().join("bot.log")
}

/// Ensure the logs directory exists.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn ensure_logs_dir() -> std::io::Result<()> {
    let dir = logs_dir();
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
    }
    Ok(())
}

/// Load `.env` files into the process environment.
///
/// The state directory's `config/.env` is read first, then `.env` in the
/// working directory. Variables already set are never overridden.
pub fn load_env_files() {
    let path = env_file();
    if path.exists() {
        if let Err(e) = dotenvy::from_path(&path) {
            tracing::warn!(path = %path.display(), error = %e, "Failed to load env file");
        }
    }
    let _ = dotenvy::dotenv();
}

/// Connection settings for the qBittorrent Web API.
#[derive(Clone)]
pub struct QbitConfig {
    /// Host name or URL (`localhost`, `https://seedbox.example`).
    pub host: String,
    /// Port; `None` keeps the URL's own port or falls back to 8080.
    pub port: Option<u16>,
    /// Web UI user.
    pub username: String,
    /// Web UI password.
    pub password: String,
}

impl QbitConfig {
    /// Build the base URL for API requests.
    ///
    /// # Errors
    /// Returns [`FetchError::InvalidUrl`] if the host cannot be parsed.
    pub fn base_url(&self) -> Result<Url, FetchError> {
        let has_scheme = self.host.contains("://");
        let raw = if has_scheme {
            self.host.clone()
        } else {
            format!("http://{}", self.host)
        };

        let mut url = Url::parse(&raw).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", raw, e)))?;
        // A bare host without a port gets the Web UI default.
        let port = match self.port {
            Some(port) => Some(port),
            None if has_scheme || url.port().is_some() => None,
            None => Some(DEFAULT_QBIT_PORT),
        };
        if let Some(port) = port {
            url.set_port(Some(port))
                .map_err(|_| FetchError::InvalidUrl(raw.clone()))?;
        }
        Ok(url)
    }
}

impl fmt::Debug for QbitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QbitConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Process-wide configuration, immutable after startup.
#[derive(Clone)]
pub struct BotConfig {
    /// Telegram bot token.
    pub telegram_token: String,
    /// The only chat the bot answers in.
    pub chat_id: ChatRef,
    /// Category the "tv" alias resolves to.
    pub tv_category: String,
    /// Category the "movies" alias resolves to.
    pub movie_category: String,
    /// Torrent client connection.
    pub qbit: QbitConfig,
    /// Auto-refresh interval.
    pub refresh_interval: Duration,
}

impl BotConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    /// Returns an error if a required variable is missing or malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    /// Returns an error if a required variable is missing or malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &'static str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let chat_raw = require("BOT_CHAT_ID")?;
        let chat_id = chat_raw
            .trim()
            .parse::<i64>()
            .map_err(|_| ConfigError::Invalid { var: "BOT_CHAT_ID", value: chat_raw.clone() })?;

        let port = match get("QBIT_PORT") {
            Some(raw) => Some(
                raw.trim()
                    .parse::<u16>()
                    .map_err(|_| ConfigError::Invalid { var: "QBIT_PORT", value: raw.clone() })?,
            ),
            None => None,
        };

        let refresh_interval = match get("REFRESH_INTERVAL_SECS") {
            Some(raw) => parse_interval(&raw)
                .ok_or(ConfigError::Invalid { var: "REFRESH_INTERVAL_SECS", value: raw.clone() })?,
            None => DEFAULT_REFRESH_INTERVAL,
        };

        Ok(Self {
            telegram_token: require("TELEGRAM_BOT_TOKEN")?,
            chat_id: ChatRef(chat_id),
            tv_category: get("TV_CATEGORY").unwrap_or_else(|| DEFAULT_TV_CATEGORY.to_string()),
            movie_category: get("MOVIE_CATEGORY").unwrap_or_else(|| DEFAULT_MOVIE_CATEGORY.to_string()),
            qbit: QbitConfig {
                host: require("QBIT_HOST")?,
                port,
                username: require("QBIT_USERNAME")?,
                password: require("QBIT_PASSWORD")?,
            },
            refresh_interval,
        })
    }

    /// Sets the refresh interval.
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Category aliases derived from this configuration.
    pub fn aliases(&self) -> CategoryAliases {
        CategoryAliases::new(&self.tv_category, &self.movie_category)
    }
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("telegram_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("tv_category", &self.tv_category)
            .field("movie_category", &self.movie_category)
            .field("qbit", &self.qbit)
            .field("refresh_interval", &self.refresh_interval)
            .finish()
    }
}

/// Parse a positive number of seconds.
fn parse_interval(raw: &str) -> Option<Duration> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn base_vars() -> HashMap<String, String> {
        [
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("BOT_CHAT_ID", "-100200300"),
            ("QBIT_HOST", "localhost"),
            ("QBIT_USERNAME", "admin"),
            ("QBIT_PASSWORD", "secret"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    fn load(vars: &HashMap<String, String>) -> Result<BotConfig, ConfigError> {
        BotConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_applied() {
        let config = load(&base_vars()).unwrap();

        assert_eq!(config.chat_id, ChatRef(-100200300));
        assert_eq!(config.tv_category, "tv-sonarr");
        assert_eq!(config.movie_category, "radarr");
        assert_eq!(config.qbit.port, None);
        assert_eq!(config.refresh_interval, Duration::from_secs(300));
    }

    #[test]
    fn test_missing_required_variable() {
        let mut vars = base_vars();
        vars.remove("QBIT_PASSWORD");

        let err = load(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("QBIT_PASSWORD")));
    }

    #[test]
    fn test_blank_value_counts_as_missing() {
        let mut vars = base_vars();
        vars.insert("TELEGRAM_BOT_TOKEN".into(), "  ".into());

        let err = load(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("TELEGRAM_BOT_TOKEN")));
    }

    #[test]
    fn test_invalid_chat_id() {
        let mut vars = base_vars();
        vars.insert("BOT_CHAT_ID".into(), "general".into());

        let err = load(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "BOT_CHAT_ID", .. }));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut vars = base_vars();
        vars.insert("REFRESH_INTERVAL_SECS".into(), "0".into());

        assert!(load(&vars).is_err());
    }

    #[test]
    fn test_overrides() {
        let mut vars = base_vars();
        vars.insert("TV_CATEGORY".into(), "shows".into());
        vars.insert("MOVIE_CATEGORY".into(), "films".into());
        vars.insert("QBIT_PORT".into(), "9090".into());
        vars.insert("REFRESH_INTERVAL_SECS".into(), "60".into());

        let config = load(&vars).unwrap();
        assert_eq!(config.tv_category, "shows");
        assert_eq!(config.movie_category, "films");
        assert_eq!(config.qbit.port, Some(9090));
        assert_eq!(config.refresh_interval, Duration::from_secs(60));
        assert_eq!(config.aliases().resolve("tv"), "shows");
    }

    #[test]
    fn test_base_url() {
        let mut qbit = load(&base_vars()).unwrap().qbit;
        assert_eq!(qbit.base_url().unwrap().as_str(), "http://localhost:8080/");

        qbit.port = Some(8999);
        assert_eq!(qbit.base_url().unwrap().as_str(), "http://localhost:8999/");

        qbit.host = "https://seedbox.example:4443".into();
        qbit.port = None;
        assert_eq!(qbit.base_url().unwrap().as_str(), "https://seedbox.example:4443/");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = load(&base_vars()).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("123:abc"));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn test_env_file_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "TELEGRAM_BOT_TOKEN=999:xyz").unwrap();
        writeln!(file, "BOT_CHAT_ID=42").unwrap();
        writeln!(file, "QBIT_HOST=nas.local").unwrap();
        writeln!(file, "QBIT_USERNAME=admin").unwrap();
        writeln!(file, "QBIT_PASSWORD=\"p w\"").unwrap();

        let vars: HashMap<String, String> = dotenvy::from_path_iter(file.path())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        let config = load(&vars).unwrap();
        assert_eq!(config.chat_id, ChatRef(42));
        assert_eq!(config.qbit.host, "nas.local");
        assert_eq!(config.qbit.password, "p w");
    }

    #[test]
    fn test_path_names() {
        assert!(env_file().ends_with(".env"));
        assert!(log_file().ends_with("bot.log"));
        assert!(logs_dir().ends_with("logs"));
        assert!(config_dir().ends_with("config"));
    }
}
