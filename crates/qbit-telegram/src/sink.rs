//! Telegram binding of the controller's chat interface.

use async_trait::async_trait;
use qbit_core::{Affordance, ChatError, ChatResult, ChatSink, PAUSE_KEY, RESUME_KEY};
use qbit_models::{ChatRef, MessageRef};
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, MessageId, ParseMode};
use teloxide::{ApiError, RequestError};
use tracing::debug;

/// Inline keyboard carrying the pause and resume controls.
pub fn controls_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("⏸️ Pause", PAUSE_KEY),
        InlineKeyboardButton::callback("▶️ Resume", RESUME_KEY),
    ]])
}

/// Map a Telegram error, recognizing messages that no longer exist.
fn map_error(message: MessageRef, e: RequestError) -> ChatError {
    match e {
        RequestError::Api(
            ApiError::MessageToEditNotFound
            | ApiError::MessageToDeleteNotFound
            | ApiError::MessageIdInvalid,
        ) => ChatError::MessageNotFound(message.0),
        other => ChatError::Request(other.to_string()),
    }
}

fn is_not_modified(e: &RequestError) -> bool {
    matches!(e, RequestError::Api(ApiError::MessageNotModified))
}

/// Publishes status messages into the designated Telegram chat.
#[derive(Clone)]
pub struct TelegramSink {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramSink {
    /// Creates a sink posting into `chat`.
    pub fn new(bot: Bot, chat: ChatRef) -> Self {
        Self {
            bot,
            chat_id: ChatId(chat.0),
        }
    }
}

#[async_trait]
impl ChatSink for TelegramSink {
    async fn send(&self, text: &str, controls: bool) -> ChatResult<MessageRef> {
        let mut req = self
            .bot
            .send_message(self.chat_id, text)
            .parse_mode(ParseMode::Html);
        if controls {
            req = req.reply_markup(controls_keyboard());
        }

        let sent = req
            .await
            .map_err(|e| ChatError::Request(e.to_string()))?;
        debug!(chat_id = %self.chat_id, message_id = sent.id.0, "Status message sent");
        Ok(MessageRef(sent.id.0))
    }

    async fn edit(&self, message: MessageRef, text: &str, controls: bool) -> ChatResult<()> {
        let mut req = self
            .bot
            .edit_message_text(self.chat_id, MessageId(message.0), text)
            .parse_mode(ParseMode::Html);
        if controls {
            req = req.reply_markup(controls_keyboard());
        }

        match req.await {
            Ok(_) => Ok(()),
            Err(e) if is_not_modified(&e) => Ok(()),
            Err(e) => Err(map_error(message, e)),
        }
    }

    async fn delete(&self, message: MessageRef) -> ChatResult<()> {
        self.bot
            .delete_message(self.chat_id, MessageId(message.0))
            .await
            .map(|_| ())
            .map_err(|e| map_error(message, e))
    }

    async fn remove_affordance(
        &self,
        message: MessageRef,
        affordance: &Affordance,
        controls: bool,
    ) -> ChatResult<()> {
        debug!(message_id = message.0, key = %affordance.key(), "Resetting inline keyboard");
        let mut req = self
            .bot
            .edit_message_reply_markup(self.chat_id, MessageId(message.0));
        if controls {
            req = req.reply_markup(controls_keyboard());
        }

        match req.await {
            Ok(_) => Ok(()),
            Err(e) if is_not_modified(&e) => Ok(()),
            Err(e) => Err(map_error(message, e)),
        }
    }

    async fn reply(&self, chat: ChatRef, text: &str) -> ChatResult<()> {
        self.bot
            .send_message(ChatId(chat.0), text)
            .parse_mode(ParseMode::Html)
            .await
            .map(|_| ())
            .map_err(|e| ChatError::Request(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controls_keyboard_layout() {
        let keyboard = controls_keyboard();
        assert_eq!(keyboard.inline_keyboard.len(), 1);
        assert_eq!(keyboard.inline_keyboard[0].len(), 2);
        assert_eq!(keyboard.inline_keyboard[0][0].text, "⏸️ Pause");
        assert_eq!(keyboard.inline_keyboard[0][1].text, "▶️ Resume");
    }

    #[test]
    fn test_missing_message_errors_are_recognized() {
        let err = map_error(MessageRef(5), RequestError::Api(ApiError::MessageToEditNotFound));
        assert!(matches!(err, ChatError::MessageNotFound(5)));

        let err = map_error(MessageRef(5), RequestError::Api(ApiError::BotBlocked));
        assert!(matches!(err, ChatError::Request(_)));
    }

    #[test]
    fn test_not_modified_detection() {
        assert!(is_not_modified(&RequestError::Api(ApiError::MessageNotModified)));
        assert!(!is_not_modified(&RequestError::Api(ApiError::BotKicked)));
    }
}
