//! Command and callback handlers for the status bot.

use std::sync::Arc;

use qbit_core::{Affordance, BotCommand, BotEvent, QbitClient, StatusController};
use qbit_models::{ChatRef, MessageRef};
use teloxide::prelude::*;
use teloxide::types::CallbackQuery;
use teloxide::utils::command::BotCommands;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::sink::TelegramSink;

/// Controller shared between the dispatcher and the refresh timer.
pub type SharedController = Arc<Mutex<StatusController<QbitClient, TelegramSink>>>;

/// Bot commands that can be invoked with /.
#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Show download status: /status [all|tv|movies|<category>] [all|completed|downloading]")]
    Status(String),

    #[command(description = "Show help message")]
    Help,
}

impl From<Command> for BotCommand {
    fn from(cmd: Command) -> Self {
        match cmd {
            Command::Status(args) => BotCommand::Status(args),
            Command::Help => BotCommand::Help,
        }
    }
}

/// Handle a parsed command from a message or channel post.
pub async fn handle_command(
    msg: Message,
    cmd: Command,
    controller: SharedController,
) -> ResponseResult<()> {
    info!(chat_id = %msg.chat.id, command = ?cmd, "Command received");
    let event = BotEvent::CommandInvoked {
        chat: ChatRef(msg.chat.id.0),
        command: cmd.into(),
    };
    controller.lock().await.handle(event).await;
    Ok(())
}

/// Toast for presses on messages that are not the live status.
const STALE_NOTICE: &str = "This status message is no longer live";

/// Toast shown to the user who pressed a button.
///
/// `tracked` tells whether the press reached the live status, `changed`
/// whether it flipped auto-refresh.
fn callback_notice(affordance: &Affordance, tracked: bool, changed: bool) -> &'static str {
    if !tracked {
        return STALE_NOTICE;
    }
    match affordance {
        Affordance::Pause if changed => "⏸️ Auto-refresh paused",
        Affordance::Pause => "Auto-refresh is already paused",
        Affordance::Resume if changed => "▶️ Auto-refresh resumed",
        Affordance::Resume => "Auto-refresh is already running",
        Affordance::Other(_) => "Unknown control",
    }
}

/// Handle an inline keyboard press.
///
/// The query is answered once the controller has handled the press, so the
/// toast reports what actually happened.
pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    controller: SharedController,
    home: ChatId,
) -> ResponseResult<()> {
    let affordance = Affordance::from_key(q.data.as_deref().unwrap_or_default());

    let notice = match q.message.as_ref() {
        None => {
            debug!("Callback without an accessible message, ignoring");
            STALE_NOTICE
        }
        Some(message) if message.chat().id != home => {
            debug!(chat_id = %message.chat().id, "Callback from another chat, ignoring");
            STALE_NOTICE
        }
        Some(message) => {
            let target = MessageRef(message.id().0);
            debug!(
                message_id = target.0,
                user_id = %q.from.id,
                key = %affordance.key(),
                "Control pressed"
            );

            let mut guard = controller.lock().await;
            let tracked = !q.from.is_bot
                && guard
                    .state()
                    .published
                    .as_ref()
                    .is_some_and(|p| p.contains(target));
            let before = guard.state().auto_refresh;
            guard
                .handle(BotEvent::AffordanceAdded {
                    message: target,
                    affordance: affordance.clone(),
                    by_bot: q.from.is_bot,
                })
                .await;
            let changed = guard.state().auto_refresh != before;
            callback_notice(&affordance, tracked, changed)
        }
    };

    bot.answer_callback_query(q.id.clone()).text(notice).await?;
    Ok(())
}

/// Reply to a slash command that did not parse.
pub async fn handle_unknown_command(bot: Bot, msg: Message) -> ResponseResult<()> {
    if let Some(text) = msg.text() {
        let name = text.split_whitespace().next().unwrap_or(text);
        info!(cmd = %name, "Unrecognized command");
        bot.send_message(
            msg.chat.id,
            format!("Unknown command: {}\n\nUse /help to see available commands.", name),
        )
        .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_command_parses_arguments() {
        let cmd = Command::parse("/status movies completed", "qbit_bot").unwrap();
        assert_eq!(cmd, Command::Status("movies completed".to_string()));

        let cmd = Command::parse("/status", "qbit_bot").unwrap();
        assert_eq!(cmd, Command::Status(String::new()));
    }

    #[test]
    fn test_command_with_bot_mention() {
        let cmd = Command::parse("/status@qbit_bot tv", "qbit_bot").unwrap();
        assert_eq!(cmd, Command::Status("tv".to_string()));
    }

    #[test]
    fn test_unknown_command_does_not_parse() {
        assert!(Command::parse("/pause", "qbit_bot").is_err());
    }

    #[test]
    fn test_command_maps_to_bot_command() {
        assert_eq!(
            BotCommand::from(Command::Status("tv".into())),
            BotCommand::Status("tv".into())
        );
        assert_eq!(BotCommand::from(Command::Help), BotCommand::Help);
    }

    #[test]
    fn test_callback_notice_reports_toggle() {
        assert_eq!(callback_notice(&Affordance::Pause, true, true), "⏸️ Auto-refresh paused");
        assert_eq!(callback_notice(&Affordance::Resume, true, true), "▶️ Auto-refresh resumed");
    }

    #[test]
    fn test_callback_notice_when_nothing_changed() {
        assert_eq!(
            callback_notice(&Affordance::Pause, true, false),
            "Auto-refresh is already paused"
        );
        assert_eq!(
            callback_notice(&Affordance::Resume, true, false),
            "Auto-refresh is already running"
        );
        assert_eq!(
            callback_notice(&Affordance::Other("x".into()), true, false),
            "Unknown control"
        );
    }

    #[test]
    fn test_callback_notice_on_stale_message() {
        assert_eq!(callback_notice(&Affordance::Pause, false, false), STALE_NOTICE);
        assert_eq!(callback_notice(&Affordance::Resume, false, false), STALE_NOTICE);
    }
}
