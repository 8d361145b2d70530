//! Bot setup: dispatcher wiring and the refresh timer.

use std::sync::Arc;
use std::time::Duration;

use qbit_core::{
    BotConfig, BotEvent, ChatSink, ControllerSettings, QbitClient, SnapshotFetcher,
    StatusController, TorrentSource,
};
use teloxide::prelude::*;
use teloxide::types::CallbackQuery;
use teloxide::utils::command::BotCommands;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::error::{BotError, Result};
use crate::handlers::{
    handle_callback, handle_command, handle_unknown_command, Command, SharedController,
};
use crate::sink::TelegramSink;

/// The download status bot.
pub struct StatusBot {
    bot: Bot,
    home: ChatId,
    refresh_interval: Duration,
    controller: SharedController,
}

impl StatusBot {
    /// Create a bot publishing into the configured chat.
    pub fn new(config: &BotConfig, client: QbitClient) -> Self {
        let bot = Bot::new(&config.telegram_token);
        let sink = TelegramSink::new(bot.clone(), config.chat_id);
        let controller = StatusController::new(
            SnapshotFetcher::new(client),
            sink,
            ControllerSettings::from(config),
        );

        Self {
            bot,
            home: ChatId(config.chat_id.0),
            refresh_interval: config.refresh_interval,
            controller: Arc::new(Mutex::new(controller)),
        }
    }

    /// Get the bot's username.
    pub async fn get_me(&self) -> Result<String> {
        let me = self
            .bot
            .get_me()
            .await
            .map_err(|e| BotError::BotStartFailed(e.to_string()))?;
        Ok(me.username().to_string())
    }

    /// Run the bot until Ctrl+C.
    pub async fn start_polling(&self) -> Result<()> {
        info!("Starting Telegram bot in polling mode...");

        if let Err(e) = self.bot.set_my_commands(Command::bot_commands()).await {
            warn!(error = %e, "Failed to register command list");
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let timer = tokio::spawn(refresh_loop(
            Arc::clone(&self.controller),
            self.refresh_interval,
            shutdown_rx,
        ));

        let controller_for_commands = Arc::clone(&self.controller);
        let controller_for_posts = Arc::clone(&self.controller);
        let controller_for_callbacks = Arc::clone(&self.controller);
        let home = self.home;

        let handler = dptree::entry()
            .branch(
                Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
                    let controller = Arc::clone(&controller_for_callbacks);
                    async move { handle_callback(bot, q, controller, home).await }
                }),
            )
            .branch(
                Update::filter_message()
                    .filter_command::<Command>()
                    .endpoint(move |msg: Message, cmd: Command| {
                        let controller = Arc::clone(&controller_for_commands);
                        async move { handle_command(msg, cmd, controller).await }
                    }),
            )
            .branch(
                Update::filter_channel_post()
                    .filter_command::<Command>()
                    .endpoint(move |msg: Message, cmd: Command| {
                        let controller = Arc::clone(&controller_for_posts);
                        async move { handle_command(msg, cmd, controller).await }
                    }),
            )
            .branch(
                Update::filter_message()
                    .filter(move |msg: Message| {
                        msg.chat.id == home
                            && msg.text().map(|t| t.starts_with('/')).unwrap_or(false)
                    })
                    .endpoint(handle_unknown_command),
            );

        info!(chat_id = %self.home, "Bot is running");

        Dispatcher::builder(self.bot.clone(), handler)
            .default_handler(|upd| async move {
                debug!("Unhandled update: {:?}", upd.id);
            })
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        let _ = shutdown_tx.send(true);
        if let Err(e) = timer.await {
            warn!(error = %e, "Refresh timer task failed");
        }

        info!("Bot stopped");
        Ok(())
    }
}

/// Deliver a timer tick every `interval` until shutdown.
async fn refresh_loop<S, C>(
    controller: Arc<Mutex<StatusController<S, C>>>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) where
    S: TorrentSource,
    C: ChatSink,
{
    info!(interval_secs = interval.as_secs(), "Refresh timer started");

    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {
                debug!("Refresh timer tick");
                controller.lock().await.handle(BotEvent::TimerTick).await;
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    debug!("Refresh timer received shutdown signal");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use qbit_core::{Affordance, ChatResult, FetchResult};
    use qbit_models::{ChatRef, MessageRef, QbitTorrent};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TorrentSource for CountingSource {
        async fn list_jobs(&self) -> FetchResult<Vec<QbitTorrent>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    struct NullChat;

    #[async_trait]
    impl ChatSink for NullChat {
        async fn send(&self, _text: &str, _controls: bool) -> ChatResult<MessageRef> {
            Ok(MessageRef(1))
        }
        async fn edit(&self, _message: MessageRef, _text: &str, _controls: bool) -> ChatResult<()> {
            Ok(())
        }
        async fn delete(&self, _message: MessageRef) -> ChatResult<()> {
            Ok(())
        }
        async fn remove_affordance(
            &self,
            _message: MessageRef,
            _affordance: &Affordance,
            _controls: bool,
        ) -> ChatResult<()> {
            Ok(())
        }
        async fn reply(&self, _chat: ChatRef, _text: &str) -> ChatResult<()> {
            Ok(())
        }
    }

    fn settings() -> ControllerSettings {
        ControllerSettings {
            channel: ChatRef(-100),
            aliases: qbit_core::CategoryAliases::new("tv-sonarr", "radarr"),
            refresh_interval: Duration::from_millis(20),
        }
    }

    #[tokio::test]
    async fn test_refresh_loop_stops_on_shutdown() {
        let source = CountingSource {
            calls: AtomicUsize::new(0),
        };
        let controller = Arc::new(Mutex::new(StatusController::new(
            SnapshotFetcher::new(source),
            NullChat,
            settings(),
        )));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(refresh_loop(
            Arc::clone(&controller),
            Duration::from_millis(20),
            shutdown_rx,
        ));

        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(true).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(1), handle).await;
        assert!(result.is_ok(), "refresh loop should stop after shutdown signal");
    }

    #[tokio::test]
    async fn test_idle_ticks_do_not_fetch() {
        let controller = Arc::new(Mutex::new(StatusController::new(
            SnapshotFetcher::new(CountingSource {
                calls: AtomicUsize::new(0),
            }),
            NullChat,
            settings(),
        )));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(refresh_loop(
            Arc::clone(&controller),
            Duration::from_millis(10),
            shutdown_rx,
        ));
        tokio::time::sleep(Duration::from_millis(60)).await;
        drop(shutdown_tx);
        handle.await.unwrap();

        let guard = controller.lock().await;
        assert_eq!(guard.fetcher().source().calls.load(Ordering::SeqCst), 0);
    }
}
