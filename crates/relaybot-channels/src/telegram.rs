//! Telegram channel: bot integration via `teloxide`.
//!
//! - Long polling (no webhook/public IP needed)
//! - Text messages and slash commands become inbound events
//! - Inline button presses become `Choice(Token)` events carrying the
//!   pressed message's id, so the router can edit that message in place
//! - Menus render as inline keyboards or one-time reply keyboards

use std::sync::Arc;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{
    BotCommand, CallbackQuery, ChatAction, InlineKeyboardButton, InlineKeyboardMarkup,
    KeyboardButton, KeyboardMarkup, KeyboardRemove, MessageId, ReplyMarkup, UpdateKind,
};
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use relaybot_core::bus::{ChoiceValue, InboundMessage, Menu, MessageBus, OutboundKind, OutboundMessage};

use crate::base::Channel;

const CHANNEL_NAME: &str = "telegram";

/// Telegram bot channel using long polling via `teloxide`.
pub struct TelegramChannel {
    bot: Bot,
    bus: Arc<MessageBus>,
    /// Command list registered with Telegram on start (name, description).
    commands: Vec<(String, String)>,
    shutdown: Arc<Notify>,
}

impl TelegramChannel {
    pub fn new(token: &str, bus: Arc<MessageBus>) -> Self {
        Self {
            bot: Bot::new(token),
            bus,
            commands: Vec::new(),
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Commands to publish in the client's command menu.
    pub fn with_commands<I, N, D>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = (N, D)>,
        N: Into<String>,
        D: Into<String>,
    {
        self.commands = commands
            .into_iter()
            .map(|(n, d)| (n.into(), d.into()))
            .collect();
        self
    }

    async fn handle_update(&self, update: &Update) {
        let inbound = match &update.kind {
            UpdateKind::Message(message) => message_to_inbound(message),
            UpdateKind::CallbackQuery(query) => {
                // Stop the client's loading spinner whatever happens next.
                if let Err(e) = self.bot.answer_callback_query(query.id.clone()).await {
                    debug!(error = %e, "failed to answer callback query");
                }
                let inbound = callback_to_inbound(query);
                if inbound.is_none() {
                    debug!(
                        user = query.from.id.0,
                        has_data = query.data.is_some(),
                        "ignoring callback query without data or source message"
                    );
                }
                inbound
            }
            _ => None,
        };

        let Some(inbound) = inbound else {
            return;
        };

        debug!(
            user = %inbound.user_key(),
            chat = %inbound.chat_id,
            kind = ?inbound.kind,
            "telegram inbound event"
        );

        if let Err(e) = self.bus.publish_inbound(inbound).await {
            error!(error = %e, "failed to publish telegram event to bus");
        }
    }

    async fn send_text(&self, chat: ChatId, text: &str, markup: Option<ReplyMarkup>) -> anyhow::Result<()> {
        let mut request = self.bot.send_message(chat, text);
        if let Some(markup) = markup {
            request = request.reply_markup(markup);
        }
        request.await?;
        Ok(())
    }

    async fn edit_text(
        &self,
        chat: ChatId,
        message_id: &str,
        text: &str,
        menu: Option<&Menu>,
    ) -> anyhow::Result<()> {
        let id: i32 = message_id
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid telegram message_id: {message_id}"))?;
        let mut request = self.bot.edit_message_text(chat, MessageId(id), text);
        if let Some(markup) = menu.and_then(inline_markup) {
            request = request.reply_markup(markup);
        }
        request.await?;
        Ok(())
    }
}

/// Map a plain Telegram message to an inbound event. Non-text messages are
/// ignored.
fn message_to_inbound(message: &Message) -> Option<InboundMessage> {
    let user = message.from.as_ref()?;
    let text = message.text()?;
    let chat_id = message.chat.id.0.to_string();

    let mut inbound = InboundMessage::from_user_text(CHANNEL_NAME, user.id.0.to_string(), chat_id, text)
        .with_metadata("message_id", message.id.0.to_string());
    if let Some(username) = &user.username {
        inbound = inbound.with_metadata("username", username.clone());
    }
    Some(inbound)
}

/// Map an inline button press to a `Choice(Token)` event.
fn callback_to_inbound(query: &CallbackQuery) -> Option<InboundMessage> {
    let data = query.data.as_deref()?;
    let message = query.message.as_ref()?;

    Some(
        InboundMessage::choice(
            CHANNEL_NAME,
            query.from.id.0.to_string(),
            message.chat().id.0.to_string(),
            ChoiceValue::Token(data.to_string()),
        )
        .with_metadata("message_id", message.id().0.to_string()),
    )
}

fn inline_markup(menu: &Menu) -> Option<InlineKeyboardMarkup> {
    match menu {
        Menu::Inline(buttons) => Some(InlineKeyboardMarkup::new(
            buttons
                .iter()
                .map(|b| vec![InlineKeyboardButton::callback(b.label.clone(), b.token.clone())]),
        )),
        Menu::Keyboard(_) => None,
    }
}

/// One button per row in both styles.
fn reply_markup(menu: &Menu) -> ReplyMarkup {
    match menu {
        Menu::Inline(_) => match inline_markup(menu) {
            Some(markup) => ReplyMarkup::InlineKeyboard(markup),
            None => ReplyMarkup::KeyboardRemove(KeyboardRemove::new()),
        },
        Menu::Keyboard(labels) => ReplyMarkup::Keyboard(
            KeyboardMarkup::new(
                labels
                    .iter()
                    .map(|label| vec![KeyboardButton::new(label.clone())]),
            )
            .one_time_keyboard()
            .resize_keyboard(),
        ),
    }
}

fn parse_chat_id(raw: &str) -> anyhow::Result<ChatId> {
    raw.parse::<i64>()
        .map(ChatId)
        .map_err(|_| anyhow::anyhow!("invalid telegram chat_id: {raw}"))
}

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        CHANNEL_NAME
    }

    async fn start(&self) -> anyhow::Result<()> {
        info!("starting telegram channel (long polling)");

        if !self.commands.is_empty() {
            let commands: Vec<BotCommand> = self
                .commands
                .iter()
                .map(|(name, description)| BotCommand::new(name.clone(), description.clone()))
                .collect();
            if let Err(e) = self.bot.set_my_commands(commands).await {
                warn!(error = %e, "failed to set bot commands menu");
            }
        }

        info!("telegram bot connected, polling for updates");

        let mut offset: i32 = 0;

        loop {
            tokio::select! {
                updates = self.bot.get_updates().offset(offset).timeout(30).send() => {
                    match updates {
                        Ok(updates) => {
                            for update in &updates {
                                offset = (update.id.0 as i32).wrapping_add(1);
                                self.handle_update(update).await;
                            }
                        }
                        Err(e) => {
                            error!(error = %e, "telegram polling error");
                            tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;
                        }
                    }
                }
                _ = self.shutdown.notified() => {
                    info!("telegram channel shutting down");
                    break;
                }
            }
        }

        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        info!("stopping telegram channel");
        self.shutdown.notify_waiters();
        Ok(())
    }

    async fn send(&self, msg: &OutboundMessage) -> anyhow::Result<()> {
        let chat = parse_chat_id(&msg.chat_id)?;

        match &msg.kind {
            OutboundKind::Typing => {
                self.bot.send_chat_action(chat, ChatAction::Typing).await?;
            }
            OutboundKind::Text { menu } => {
                self.send_text(chat, &msg.content, menu.as_ref().map(reply_markup))
                    .await?;
            }
            OutboundKind::RemoveMenu => {
                self.send_text(
                    chat,
                    &msg.content,
                    Some(ReplyMarkup::KeyboardRemove(KeyboardRemove::new())),
                )
                .await?;
            }
            OutboundKind::Edit { message_id, menu } => {
                // Reply keyboards cannot be attached by an edit, and the
                // original message may be gone; both fall back to a new message.
                let editable = !matches!(menu, Some(Menu::Keyboard(_)));
                let edited = if editable {
                    match self.edit_text(chat, message_id, &msg.content, menu.as_ref()).await {
                        Ok(()) => true,
                        Err(e) => {
                            warn!(chat = %msg.chat_id, message_id = %message_id, error = %e, "edit failed, sending new message");
                            false
                        }
                    }
                } else {
                    false
                };
                if !edited {
                    self.send_text(chat, &msg.content, menu.as_ref().map(reply_markup))
                        .await?;
                }
            }
        }

        debug!(chat_id = %msg.chat_id, kind = ?msg.kind, "telegram message sent");
        Ok(())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
