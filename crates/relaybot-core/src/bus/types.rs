//! Bus event types: what channels hand to the router and what the router hands back.
//!
//! Inbound events come in three shapes (command, free text, menu choice).
//! Outbound events are transport actions: send text (optionally with a menu),
//! edit a previously sent message, remove the active menu, or show a typing
//! indicator.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

// ─────────────────────────────────────────────
// Inbound
// ─────────────────────────────────────────────

/// A menu selection delivered by a channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChoiceValue {
    /// A plain label, as pressed on a reply keyboard or typed by hand.
    Label(String),
    /// A structured callback token (e.g. `"model:claude:claude-3-5-haiku-latest"`).
    Token(String),
}

impl ChoiceValue {
    /// The raw string carried by the choice.
    pub fn as_str(&self) -> &str {
        match self {
            ChoiceValue::Label(s) | ChoiceValue::Token(s) => s,
        }
    }
}

/// The shape of an inbound event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InboundKind {
    /// A named command without the leading slash (e.g. `"choose_model"`).
    Command { name: String, args: String },
    /// Free chat text; the prompt is in `InboundMessage::content`.
    Text,
    /// A menu choice.
    Choice(ChoiceValue),
}

/// An inbound event from a channel to the router.
#[derive(Clone, Debug)]
pub struct InboundMessage {
    /// Channel name (e.g. "telegram", "cli").
    pub channel: String,
    /// Sender identifier within the channel.
    pub sender_id: String,
    /// Chat/conversation identifier.
    pub chat_id: String,
    /// Raw text of the event (prompt, command line, or choice value).
    pub content: String,
    /// Event shape.
    pub kind: InboundKind,
    /// When the event was received.
    pub timestamp: DateTime<Utc>,
    /// Channel-specific metadata (e.g. message_id, username).
    pub metadata: HashMap<String, String>,
}

impl InboundMessage {
    fn build(
        channel: impl Into<String>,
        sender_id: impl Into<String>,
        chat_id: impl Into<String>,
        content: String,
        kind: InboundKind,
    ) -> Self {
        InboundMessage {
            channel: channel.into(),
            sender_id: sender_id.into(),
            chat_id: chat_id.into(),
            content,
            kind,
            timestamp: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    /// Create a free-text event.
    pub fn text(
        channel: impl Into<String>,
        sender_id: impl Into<String>,
        chat_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::build(channel, sender_id, chat_id, content.into(), InboundKind::Text)
    }

    /// Create a command event. `name` is taken without the leading slash.
    pub fn command(
        channel: impl Into<String>,
        sender_id: impl Into<String>,
        chat_id: impl Into<String>,
        name: impl Into<String>,
        args: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let args = args.into();
        let content = if args.is_empty() {
            format!("/{name}")
        } else {
            format!("/{name} {args}")
        };
        Self::build(
            channel,
            sender_id,
            chat_id,
            content,
            InboundKind::Command { name, args },
        )
    }

    /// Create a menu-choice event.
    pub fn choice(
        channel: impl Into<String>,
        sender_id: impl Into<String>,
        chat_id: impl Into<String>,
        value: ChoiceValue,
    ) -> Self {
        let content = value.as_str().to_string();
        Self::build(channel, sender_id, chat_id, content, InboundKind::Choice(value))
    }

    /// Parse a line of user input the way chat transports do:
    /// `/name args` (with an optional `@botname` suffix) is a command,
    /// anything else is free text.
    pub fn from_user_text(
        channel: impl Into<String>,
        sender_id: impl Into<String>,
        chat_id: impl Into<String>,
        text: &str,
    ) -> Self {
        if let Some(rest) = text.strip_prefix('/') {
            let mut parts = rest.splitn(2, char::is_whitespace);
            let head = parts.next().unwrap_or("");
            let name = head.split('@').next().unwrap_or(head);
            if !name.is_empty() {
                let args = parts.next().unwrap_or("").trim();
                return Self::command(channel, sender_id, chat_id, name, args);
            }
        }
        Self::text(channel, sender_id, chat_id, text)
    }

    /// Attach a metadata entry (builder style).
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Store key for the user behind this event (e.g. "telegram:123456").
    ///
    /// Selections and per-user ordering are keyed by this value, so the same
    /// numeric id on two channels never collides.
    pub fn user_key(&self) -> String {
        format!("{}:{}", self.channel, self.sender_id)
    }

    /// The platform message id this event refers to, if the channel set one.
    pub fn message_id(&self) -> Option<&str> {
        self.metadata.get("message_id").map(String::as_str)
    }
}

// ─────────────────────────────────────────────
// Menus
// ─────────────────────────────────────────────

/// One selectable entry of an inline menu.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MenuButton {
    /// Text shown to the user.
    pub label: String,
    /// Callback token delivered back as `ChoiceValue::Token`.
    pub token: String,
}

impl MenuButton {
    pub fn new(label: impl Into<String>, token: impl Into<String>) -> Self {
        MenuButton {
            label: label.into(),
            token: token.into(),
        }
    }
}

/// A selectable-choice menu attached to an outbound message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Menu {
    /// Flat list of labels (one-time reply keyboard). Picks come back as labels.
    Keyboard(Vec<String>),
    /// Label/token pairs (inline buttons). Picks come back as tokens.
    Inline(Vec<MenuButton>),
}

impl Menu {
    /// Number of entries in the menu.
    pub fn len(&self) -> usize {
        match self {
            Menu::Keyboard(labels) => labels.len(),
            Menu::Inline(buttons) => buttons.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Labels in display order.
    pub fn labels(&self) -> Vec<&str> {
        match self {
            Menu::Keyboard(labels) => labels.iter().map(String::as_str).collect(),
            Menu::Inline(buttons) => buttons.iter().map(|b| b.label.as_str()).collect(),
        }
    }

    /// The choice value produced by picking entry `index`.
    pub fn pick(&self, index: usize) -> Option<ChoiceValue> {
        match self {
            Menu::Keyboard(labels) => labels.get(index).cloned().map(ChoiceValue::Label),
            Menu::Inline(buttons) => buttons
                .get(index)
                .map(|b| ChoiceValue::Token(b.token.clone())),
        }
    }
}

// ─────────────────────────────────────────────
// Outbound
// ─────────────────────────────────────────────

/// What the channel should do with an outbound message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutboundKind {
    /// Send `content` as a new message, optionally with a menu.
    Text { menu: Option<Menu> },
    /// Replace the text (and menu) of a previously sent message.
    Edit {
        message_id: String,
        menu: Option<Menu>,
    },
    /// Send `content` and remove any active reply keyboard.
    RemoveMenu,
    /// Show a transient "working" indicator. `content` is empty.
    Typing,
}

/// An outbound event from the router to a channel.
#[derive(Clone, Debug)]
pub struct OutboundMessage {
    /// Target channel name.
    pub channel: String,
    /// Target chat/conversation identifier.
    pub chat_id: String,
    /// Text content to send.
    pub content: String,
    /// Transport action.
    pub kind: OutboundKind,
    /// Channel-specific metadata.
    pub metadata: HashMap<String, String>,
}

impl OutboundMessage {
    /// Create a plain text message.
    pub fn new(
        channel: impl Into<String>,
        chat_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        OutboundMessage {
            channel: channel.into(),
            chat_id: chat_id.into(),
            content: content.into(),
            kind: OutboundKind::Text { menu: None },
            metadata: HashMap::new(),
        }
    }

    /// Create a text message with an attached menu.
    pub fn with_menu(
        channel: impl Into<String>,
        chat_id: impl Into<String>,
        content: impl Into<String>,
        menu: Menu,
    ) -> Self {
        let mut msg = Self::new(channel, chat_id, content);
        msg.kind = OutboundKind::Text { menu: Some(menu) };
        msg
    }

    /// Edit a previously sent message in place.
    pub fn edit(
        channel: impl Into<String>,
        chat_id: impl Into<String>,
        message_id: impl Into<String>,
        content: impl Into<String>,
        menu: Option<Menu>,
    ) -> Self {
        let mut msg = Self::new(channel, chat_id, content);
        msg.kind = OutboundKind::Edit {
            message_id: message_id.into(),
            menu,
        };
        msg
    }

    /// Send text and remove the chat's reply keyboard.
    pub fn remove_menu(
        channel: impl Into<String>,
        chat_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let mut msg = Self::new(channel, chat_id, content);
        msg.kind = OutboundKind::RemoveMenu;
        msg
    }

    /// Typing indicator.
    pub fn typing(channel: impl Into<String>, chat_id: impl Into<String>) -> Self {
        let mut msg = Self::new(channel, chat_id, "");
        msg.kind = OutboundKind::Typing;
        msg
    }

    /// The menu attached to this message, if any.
    pub fn menu(&self) -> Option<&Menu> {
        match &self.kind {
            OutboundKind::Text { menu } | OutboundKind::Edit { menu, .. } => menu.as_ref(),
            OutboundKind::RemoveMenu | OutboundKind::Typing => None,
        }
    }
}
