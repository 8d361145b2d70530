//! Status refresh controller.
//!
//! The controller owns the only mutable bot state ([`RefreshState`]) and is
//! driven by one inbound [`BotEvent`] at a time. It has two states: idle (no
//! status message) and published (one tracked status publication, possibly
//! spanning several pages). Publishing always retires the previous
//! publication first, so at most one is live.
//!
//! Errors never leave the controller. Command-triggered failures are reported
//! in the chat once; timer-triggered failures are only logged.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{Local, NaiveTime};
use qbit_models::{ChatRef, MessageRef, StatusFilter};
use tracing::{debug, error, info, trace, warn};

use crate::config::BotConfig;
use crate::error::{ChatError, ChatResult};
use crate::fetcher::{SnapshotFetcher, TorrentSource};
use crate::filter::{self, CategoryAliases, ALL_CATEGORIES};
use crate::format;

/// Callback key of the pause control.
pub const PAUSE_KEY: &str = "pause";

/// Callback key of the resume control.
pub const RESUME_KEY: &str = "resume";

/// The chat platform as seen by the controller.
///
/// `send`, `edit` and `delete` act on the designated status chat; `reply`
/// answers in whichever chat a command came from.
#[async_trait]
pub trait ChatSink: Send + Sync {
    /// Post a message. `controls` attaches the pause/resume affordances.
    async fn send(&self, text: &str, controls: bool) -> ChatResult<MessageRef>;

    /// Replace the text of a message, keeping controls if `controls` is set.
    async fn edit(&self, message: MessageRef, text: &str, controls: bool) -> ChatResult<()>;

    /// Delete a message.
    async fn delete(&self, message: MessageRef) -> ChatResult<()>;

    /// Strip a foreign affordance from a message. `controls` tells whether the
    /// message should keep the pause/resume affordances.
    async fn remove_affordance(
        &self,
        message: MessageRef,
        affordance: &Affordance,
        controls: bool,
    ) -> ChatResult<()>;

    /// Send a one-off reply to a chat.
    async fn reply(&self, chat: ChatRef, text: &str) -> ChatResult<()>;
}

/// Commands the controller understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    /// `/status [category] [status]` with its raw argument text.
    Status(String),
    /// `/help`.
    Help,
}

/// A reaction-like control applied to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Affordance {
    /// Stop auto-refreshing.
    Pause,
    /// Start auto-refreshing again.
    Resume,
    /// Anything that is not one of the two controls.
    Other(String),
}

impl Affordance {
    /// Map a platform key (callback data, emoji) onto an affordance.
    pub fn from_key(key: &str) -> Self {
        match key {
            PAUSE_KEY => Self::Pause,
            RESUME_KEY => Self::Resume,
            other => Self::Other(other.to_string()),
        }
    }

    /// The platform key for this affordance.
    pub fn key(&self) -> &str {
        match self {
            Self::Pause => PAUSE_KEY,
            Self::Resume => RESUME_KEY,
            Self::Other(key) => key,
        }
    }
}

/// Inbound events, from the chat front-end or the refresh timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotEvent {
    /// A user invoked a command in `chat`.
    CommandInvoked {
        /// Chat the command was sent in.
        chat: ChatRef,
        /// The parsed command.
        command: BotCommand,
    },
    /// An affordance was applied to a message.
    AffordanceAdded {
        /// Message the affordance was applied to.
        message: MessageRef,
        /// Which affordance.
        affordance: Affordance,
        /// Whether the actor is a bot (bots never toggle refreshing).
        by_bot: bool,
    },
    /// An affordance was withdrawn from a message.
    AffordanceRemoved {
        /// Message the affordance was removed from.
        message: MessageRef,
        /// Which affordance.
        affordance: Affordance,
        /// Whether the actor is a bot.
        by_bot: bool,
    },
    /// The refresh interval elapsed.
    TimerTick,
}

/// Arguments of a `/status` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRequest {
    /// Requested category, before alias resolution.
    pub category: String,
    /// Requested status filter.
    pub filter: StatusFilter,
}

impl StatusRequest {
    /// Parse `/status` arguments.
    ///
    /// Accepts no arguments, a category, a status keyword, or a category
    /// followed by a status keyword.
    ///
    /// # Errors
    /// Returns a description of the problem for unknown status keywords or
    /// extra arguments.
    pub fn parse(args: &str) -> Result<Self, String> {
        let tokens: Vec<&str> = args.split_whitespace().collect();
        match tokens.as_slice() {
            [] => Ok(Self {
                category: ALL_CATEGORIES.to_string(),
                filter: StatusFilter::All,
            }),
            [single] => Ok(match single.parse::<StatusFilter>() {
                Ok(filter) => Self {
                    category: ALL_CATEGORIES.to_string(),
                    filter,
                },
                Err(_) => Self {
                    category: single.to_string(),
                    filter: StatusFilter::All,
                },
            }),
            [category, status] => Ok(Self {
                category: category.to_string(),
                filter: status.parse()?,
            }),
            _ => Err(format!("expected at most 2 arguments, got {}", tokens.len())),
        }
    }
}

/// The status publication currently shown in the chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedStatus {
    /// Page messages in display order; the first carries the controls.
    /// Empty after a scheduled republish that could not send anything.
    pub pages: Vec<MessageRef>,
    /// Body of the first page without its footer.
    pub first_body: String,
    /// When the content was last fetched.
    pub updated_at: NaiveTime,
}

impl PublishedStatus {
    /// The page carrying the controls and footer.
    pub fn first_page(&self) -> Option<MessageRef> {
        self.pages.first().copied()
    }

    /// Whether `message` belongs to this publication.
    pub fn contains(&self, message: MessageRef) -> bool {
        self.pages.contains(&message)
    }
}

/// Mutable bot state, memory-resident only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshState {
    /// Active category (already alias-resolved).
    pub category: String,
    /// Active status filter.
    pub filter: StatusFilter,
    /// Whether timer ticks refresh the publication.
    pub auto_refresh: bool,
    /// The live publication, if any.
    pub published: Option<PublishedStatus>,
}

impl Default for RefreshState {
    fn default() -> Self {
        Self {
            category: ALL_CATEGORIES.to_string(),
            filter: StatusFilter::All,
            auto_refresh: true,
            published: None,
        }
    }
}

/// Static settings the controller needs from the configuration.
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    /// The only chat commands are accepted in.
    pub channel: ChatRef,
    /// Category shorthands.
    pub aliases: CategoryAliases,
    /// Interval shown in the footer.
    pub refresh_interval: Duration,
}

impl From<&BotConfig> for ControllerSettings {
    fn from(config: &BotConfig) -> Self {
        Self {
            channel: config.chat_id,
            aliases: config.aliases(),
            refresh_interval: config.refresh_interval,
        }
    }
}

/// Drives fetch → filter → format → publish for one chat.
pub struct StatusController<S, C> {
    fetcher: SnapshotFetcher<S>,
    chat: C,
    settings: ControllerSettings,
    state: RefreshState,
}

impl<S: TorrentSource, C: ChatSink> StatusController<S, C> {
    /// Creates an idle controller.
    pub fn new(fetcher: SnapshotFetcher<S>, chat: C, settings: ControllerSettings) -> Self {
        Self {
            fetcher,
            chat,
            settings,
            state: RefreshState::default(),
        }
    }

    /// Current state (read-only).
    pub fn state(&self) -> &RefreshState {
        &self.state
    }

    /// The chat binding.
    pub fn chat(&self) -> &C {
        &self.chat
    }

    /// The snapshot fetcher.
    pub fn fetcher(&self) -> &SnapshotFetcher<S> {
        &self.fetcher
    }

    /// Handle one inbound event.
    pub async fn handle(&mut self, event: BotEvent) {
        match event {
            BotEvent::CommandInvoked { chat, command } => self.on_command(chat, command).await,
            BotEvent::AffordanceAdded {
                message,
                affordance,
                by_bot,
            } => self.on_affordance_added(message, affordance, by_bot).await,
            BotEvent::AffordanceRemoved {
                message, affordance, ..
            } => {
                debug!(message = %message, affordance = %affordance.key(), "Affordance removed, ignoring");
            }
            BotEvent::TimerTick => self.on_tick().await,
        }
    }

    async fn on_command(&mut self, chat: ChatRef, command: BotCommand) {
        if chat != self.settings.channel {
            info!(chat = %chat, command = ?command, "Command rejected outside the status chat");
            self.reply_or_log(chat, format::WRONG_CHANNEL_REPLY).await;
            return;
        }

        match command {
            BotCommand::Help => self.reply_or_log(chat, format::HELP_TEXT).await,
            BotCommand::Status(args) => match StatusRequest::parse(&args) {
                Ok(request) => self.show_status(request).await,
                Err(reason) => {
                    debug!(args = %args, reason = %reason, "Malformed status command");
                    self.reply_or_log(chat, format::USAGE_REPLY).await;
                }
            },
        }
    }

    async fn show_status(&mut self, request: StatusRequest) {
        self.state.category = self.settings.aliases.resolve(&request.category);
        self.state.filter = request.filter;
        info!(
            category = %self.state.category,
            filter = %self.state.filter,
            "Publishing status"
        );

        self.retire().await;
        if let Err(e) = self.publish().await {
            error!(error = %e, "Error in status command");
            let notice = format::error_notice(&e.to_string());
            self.reply_or_log(self.settings.channel, &notice).await;
        }
    }

    async fn on_tick(&mut self) {
        if self.state.published.is_none() || !self.state.auto_refresh {
            trace!(
                published = self.state.published.is_some(),
                auto_refresh = self.state.auto_refresh,
                "Tick skipped"
            );
            return;
        }

        if let Err(e) = self.refresh().await {
            error!(error = %e, "Scheduled refresh failed");
        }
    }

    async fn on_affordance_added(&mut self, message: MessageRef, affordance: Affordance, by_bot: bool) {
        let Some(published) = &self.state.published else {
            debug!(message = %message, "Affordance with no status published, ignoring");
            return;
        };
        if !published.contains(message) {
            debug!(message = %message, "Affordance on untracked message, ignoring");
            return;
        }
        if by_bot {
            trace!(message = %message, "Affordance by bot, ignoring");
            return;
        }

        match affordance {
            Affordance::Pause => self.set_auto_refresh(false).await,
            Affordance::Resume => self.set_auto_refresh(true).await,
            Affordance::Other(ref key) => {
                let controls = published.first_page() == Some(message);
                info!(message = %message, affordance = %key, "Removing foreign affordance");
                if let Err(e) = self.chat.remove_affordance(message, &affordance, controls).await {
                    warn!(message = %message, error = %e, "Failed to remove affordance");
                }
            }
        }
    }

    async fn set_auto_refresh(&mut self, enabled: bool) {
        if self.state.auto_refresh == enabled {
            debug!(enabled, "Auto-refresh already in requested state");
            return;
        }
        self.state.auto_refresh = enabled;
        info!(enabled, "Auto-refresh toggled");

        let Some(published) = &self.state.published else {
            return;
        };
        let Some(first) = published.first_page() else {
            return;
        };
        let footer = self.footer(published.updated_at);
        let text = format::attach_footer(&published.first_body, &footer);
        if let Err(e) = self.chat.edit(first, &text, true).await {
            warn!(message = %first, error = %e, "Failed to update status footer");
        }
    }

    /// Delete every page of the live publication.
    async fn retire(&mut self) {
        let Some(published) = self.state.published.take() else {
            return;
        };
        for page in published.pages {
            if let Err(e) = self.chat.delete(page).await {
                warn!(message = %page, error = %e, "Failed to delete previous status message");
            }
        }
    }

    /// Fetch and post a new publication. Pages sent before a failure stay
    /// tracked so the next publish retires them.
    async fn publish(&mut self) -> ChatResult<()> {
        let bodies = self.render_bodies().await;
        let updated_at = Local::now().time();
        let footer = self.footer(updated_at);

        let mut pages = Vec::with_capacity(bodies.len());
        let mut result = Ok(());
        for (index, body) in bodies.iter().enumerate() {
            let first = index == 0;
            let text = if first {
                format::attach_footer(body, &footer)
            } else {
                body.clone()
            };
            match self.chat.send(&text, first).await {
                Ok(message) => pages.push(message),
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }

        if !pages.is_empty() {
            debug!(pages = pages.len(), "Status published");
            self.state.published = Some(PublishedStatus {
                pages,
                first_body: bodies.into_iter().next().unwrap_or_default(),
                updated_at,
            });
        }
        result
    }

    /// Replace the live publication during a refresh.
    ///
    /// If nothing could be sent, the controller stays published with no
    /// pages so the next tick tries again.
    async fn republish(&mut self) -> ChatResult<()> {
        self.retire().await;
        let result = self.publish().await;
        if self.state.published.is_none() {
            self.state.published = Some(PublishedStatus {
                pages: Vec::new(),
                first_body: String::new(),
                updated_at: Local::now().time(),
            });
        }
        result
    }

    /// Re-fetch and edit the live publication in place, republishing when the
    /// page count changed or a page has disappeared.
    async fn refresh(&mut self) -> ChatResult<()> {
        let Some(pages) = self.state.published.as_ref().map(|p| p.pages.clone()) else {
            return Ok(());
        };

        let bodies = self.render_bodies().await;
        if bodies.len() != pages.len() {
            debug!(old = pages.len(), new = bodies.len(), "Page count changed, republishing");
            return self.republish().await;
        }

        let updated_at = Local::now().time();
        let footer = self.footer(updated_at);
        for (index, (page, body)) in pages.iter().zip(&bodies).enumerate() {
            let first = index == 0;
            let text = if first {
                format::attach_footer(body, &footer)
            } else {
                body.clone()
            };
            match self.chat.edit(*page, &text, first).await {
                Ok(()) => {}
                Err(ChatError::MessageNotFound(_)) => {
                    warn!(message = %page, "Status message disappeared, republishing");
                    return self.republish().await;
                }
                Err(e) => return Err(e),
            }
        }

        if let Some(published) = self.state.published.as_mut() {
            published.first_body = bodies.into_iter().next().unwrap_or_default();
            published.updated_at = updated_at;
        }
        debug!(pages = pages.len(), "Status refreshed");
        Ok(())
    }

    /// Fetch, filter and paginate; always yields at least one page body.
    async fn render_bodies(&self) -> Vec<String> {
        let records = self.fetcher.fetch().await;
        let filtered = filter::apply(records, &self.state.category, self.state.filter);
        let blocks = format::paginate(&filtered);

        if blocks.is_empty() {
            return vec![format::render_empty_page()];
        }
        let total = blocks.len();
        blocks
            .iter()
            .enumerate()
            .map(|(index, block)| format::render_page(block, index, total))
            .collect()
    }

    fn footer(&self, updated_at: NaiveTime) -> String {
        format::format_footer(self.state.auto_refresh, self.settings.refresh_interval, updated_at)
    }

    async fn reply_or_log(&self, chat: ChatRef, text: &str) {
        if let Err(e) = self.chat.reply(chat, text).await {
            error!(chat = %chat, error = %e, "Failed to send reply");
        }
    }
}
