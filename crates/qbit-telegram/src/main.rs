//! qBittorrent status bot binary.
//!
//! Start the bot with:
//! ```bash
//! TELEGRAM_BOT_TOKEN=xxx BOT_CHAT_ID=-100123 cargo run -p qbit-telegram
//! ```

use std::fs::OpenOptions;
use std::sync::Mutex;
use std::time::Duration;

use clap::Parser;
use qbit_core::{config, BotConfig, QbitClient};
use qbit_telegram::StatusBot;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// qBittorrent status bot - auto-refreshing download reports in Telegram
#[derive(Parser, Debug)]
#[command(name = "qbit-telegram")]
#[command(about = "Telegram bot publishing qBittorrent download status")]
struct Args {
    /// Auto-refresh interval in seconds (overrides REFRESH_INTERVAL_SECS)
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    interval: Option<u64>,

    /// Only log to the terminal
    #[arg(long)]
    no_log_file: bool,

    /// Verbose logging (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8, log_to_file: bool) {
    let filter = match verbose {
        0 => "qbit_telegram=info,qbit_core=info,teloxide=warn",
        1 => "qbit_telegram=debug,qbit_core=debug,teloxide=info",
        2 => "qbit_telegram=trace,qbit_core=trace,teloxide=debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = if log_to_file {
        let opened = config::ensure_logs_dir().and_then(|_| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(config::log_file())
        });
        match opened {
            Ok(file) => Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            ),
            Err(e) => {
                eprintln!("Warning: could not open log file: {}", e);
                None
            }
        }
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Config directory first, then a local .env
    config::load_env_files();

    init_logging(args.verbose, !args.no_log_file);

    let mut bot_config = match BotConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };
    if let Some(secs) = args.interval {
        bot_config = bot_config.with_refresh_interval(Duration::from_secs(secs));
    }
    tracing::debug!(config = ?bot_config, "Configuration loaded");

    // Startup halts when the qBittorrent login fails
    let client = match QbitClient::connect(&bot_config.qbit).await {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(host = %bot_config.qbit.host, error = %e, "Failed to log in to qBittorrent");
            return Err(e.into());
        }
    };
    match client.app_version().await {
        Ok(version) => {
            tracing::info!(url = %client.base_url(), version = %version, "Connected to qBittorrent")
        }
        Err(e) => tracing::warn!(error = %e, "Could not read qBittorrent version"),
    }

    let bot = StatusBot::new(&bot_config, client);

    match bot.get_me().await {
        Ok(username) => {
            tracing::info!(username = %username, "Bot initialized successfully");
            println!("\n[robot] qBittorrent Status Bot");
            println!("   Bot: @{}", username);
            println!("   Chat: {}", bot_config.chat_id);
            println!(
                "   Refresh: every {}s",
                bot_config.refresh_interval.as_secs()
            );
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to get bot info");
            return Err(e.into());
        }
    }

    println!("\n[phone] Send /status in the chat to publish a report");
    println!("   Press Ctrl+C to stop\n");

    bot.start_polling().await?;

    Ok(())
}
