//! Bot router: turns inbound events into outbound events.
//!
//! Commands are answered directly, menu choices go to the
//! [`SelectionWizard`], and chat text goes to the [`Dispatcher`] unless the
//! user is in the middle of a selection.
//!
//! [`BotRouter::run`] consumes the bus and gives every user an ordered lane
//! (a worker task fed by an mpsc channel), so one user's slow request never
//! delays another user.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use relaybot_core::bus::{ChoiceValue, InboundKind, InboundMessage, MessageBus, OutboundMessage};
use relaybot_core::config::{BotConfig, Config, MenuStyle};
use relaybot_providers::{ClientMap, ProviderRegistry, RegistryError};

use crate::dispatcher::Dispatcher;
use crate::store::{InMemorySelectionStore, SelectionStore};
use crate::texts;
use crate::wizard::{SelectionWizard, WizardOutcome, WizardReply};

// ─────────────────────────────────────────────
// Outbound sinks
// ─────────────────────────────────────────────

/// Where the router emits outbound events while handling one inbound event.
#[async_trait]
trait OutboundSink: Send {
    async fn emit(&mut self, msg: OutboundMessage);
}

#[async_trait]
impl OutboundSink for Vec<OutboundMessage> {
    async fn emit(&mut self, msg: OutboundMessage) {
        self.push(msg);
    }
}

#[async_trait]
impl OutboundSink for mpsc::Sender<OutboundMessage> {
    async fn emit(&mut self, msg: OutboundMessage) {
        if let Err(e) = self.send(msg).await {
            error!(error = %e, "failed to publish outbound message");
        }
    }
}

// ─────────────────────────────────────────────
// BotRouter
// ─────────────────────────────────────────────

pub struct BotRouter {
    store: Arc<dyn SelectionStore>,
    registry: Arc<ProviderRegistry>,
    wizard: SelectionWizard,
    dispatcher: Dispatcher,
    menu_style: MenuStyle,
}

impl BotRouter {
    pub fn new(
        store: Arc<dyn SelectionStore>,
        registry: Arc<ProviderRegistry>,
        clients: ClientMap,
        bot: &BotConfig,
    ) -> Self {
        let wizard = SelectionWizard::new(store.clone(), registry.clone(), bot.menu_style);
        let dispatcher = Dispatcher::new(store.clone(), clients, bot.chunk_size);
        Self {
            store,
            registry,
            wizard,
            dispatcher,
            menu_style: bot.menu_style,
        }
    }

    /// Build the registry and an in-memory store from `config`.
    pub fn from_config(config: &Config, clients: ClientMap) -> Result<Self, RegistryError> {
        let registry = Arc::new(ProviderRegistry::from_config(config)?);
        let store = Arc::new(InMemorySelectionStore::new(
            registry.default_provider(),
            registry.default_model(),
        ));
        info!(
            provider = %registry.default_provider(),
            model = registry.default_model(),
            clients = clients.len(),
            "router initialized"
        );
        Ok(Self::new(store, registry, clients, &config.bot))
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Handle one inbound event and return the outbound events in order.
    pub async fn handle_event(&self, msg: &InboundMessage) -> Vec<OutboundMessage> {
        let mut out = Vec::new();
        self.process(msg, &mut out).await;
        out
    }

    async fn process(&self, msg: &InboundMessage, out: &mut dyn OutboundSink) {
        let user = msg.user_key();
        match &msg.kind {
            InboundKind::Command { name, .. } => {
                debug!(user = %user, command = %name, "command");
                out.emit(self.command(msg, &user, name)).await;
            }
            InboundKind::Choice(value) => {
                let reply = self.wizard.choose(&user, value);
                out.emit(self.wizard_outbound(msg, reply)).await;
            }
            InboundKind::Text => {
                let text = msg.content.as_str();
                if self.wizard.is_menu_label(text) {
                    // Typed or reply-keyboard label
                    let reply = self.wizard.choose(&user, &ChoiceValue::Label(text.to_string()));
                    out.emit(self.wizard_outbound(msg, reply)).await;
                } else if self.store.get_state(&user).is_active() {
                    out.emit(OutboundMessage::new(&msg.channel, &msg.chat_id, texts::FINISH_SELECTION))
                        .await;
                } else {
                    out.emit(OutboundMessage::typing(&msg.channel, &msg.chat_id)).await;
                    for chunk in self.dispatcher.handle(&user, text).await {
                        out.emit(OutboundMessage::new(&msg.channel, &msg.chat_id, chunk)).await;
                    }
                }
            }
        }
    }

    fn command(&self, msg: &InboundMessage, user: &str, name: &str) -> OutboundMessage {
        let reply = |text: String| OutboundMessage::new(&msg.channel, &msg.chat_id, text);
        match name {
            "start" => reply(texts::WELCOME.to_string()),
            "help" => reply(texts::help(&self.registry)),
            "choose_model" => self.wizard_outbound(msg, self.wizard.begin(user)),
            "quick_select" => self.wizard_outbound(msg, self.wizard.quick_menu()),
            "current_model" => reply(texts::current_model(&self.store.snapshot(user))),
            "hide_keyboard" | "clear" | "remove_keyboard" => {
                OutboundMessage::remove_menu(&msg.channel, &msg.chat_id, texts::KEYBOARD_HIDDEN)
            }
            other => reply(texts::unknown_command(other)),
        }
    }

    /// Render a wizard reply: edit the pressed menu in place when the
    /// channel told us which message it was, otherwise send a new message.
    fn wizard_outbound(&self, msg: &InboundMessage, reply: WizardReply) -> OutboundMessage {
        let from_button = matches!(msg.kind, InboundKind::Choice(ChoiceValue::Token(_)));
        if let (true, Some(message_id)) = (from_button, msg.message_id()) {
            return OutboundMessage::edit(&msg.channel, &msg.chat_id, message_id, reply.text, reply.menu);
        }
        match (reply.menu, &reply.outcome) {
            (Some(menu), _) => OutboundMessage::with_menu(&msg.channel, &msg.chat_id, reply.text, menu),
            (None, WizardOutcome::Completed { .. }) if self.menu_style == MenuStyle::Keyboard => {
                OutboundMessage::remove_menu(&msg.channel, &msg.chat_id, reply.text)
            }
            (None, _) => OutboundMessage::new(&msg.channel, &msg.chat_id, reply.text),
        }
    }

    /// Consume inbound events until the bus closes.
    pub async fn run(self: Arc<Self>, bus: Arc<MessageBus>) {
        info!("router started, waiting for messages");
        let mut lanes: HashMap<String, mpsc::UnboundedSender<InboundMessage>> = HashMap::new();

        while let Some(msg) = bus.consume_inbound().await {
            let key = msg.user_key();
            let lane = lanes
                .entry(key.clone())
                .or_insert_with(|| self.clone().spawn_lane(key.clone(), bus.outbound_sender()));

            if let Err(mpsc::error::SendError(msg)) = lane.send(msg) {
                warn!(user = %key, "lane closed, restarting");
                let lane = self.clone().spawn_lane(key.clone(), bus.outbound_sender());
                if lane.send(msg).is_err() {
                    error!(user = %key, "restarted lane closed, dropping event");
                }
                lanes.insert(key, lane);
            }
        }

        info!("inbound channel closed, router exiting");
    }

    /// Spawn the worker that handles one user's events in arrival order.
    fn spawn_lane(
        self: Arc<Self>,
        user: String,
        outbound: mpsc::Sender<OutboundMessage>,
    ) -> mpsc::UnboundedSender<InboundMessage> {
        let (tx, mut rx) = mpsc::unbounded_channel::<InboundMessage>();
        debug!(user = %user, "lane started");

        tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                let router = self.clone();
                let mut sink = outbound.clone();
                let event = msg.clone();
                // A panic stays inside this task and surfaces as a JoinError
                let handle = tokio::spawn(async move { router.process(&event, &mut sink).await });

                if let Err(e) = handle.await {
                    error!(user = %user, chat = %msg.chat_id, error = %e, "event handler failed");
                    let apology = OutboundMessage::new(&msg.channel, &msg.chat_id, texts::GENERIC_ERROR);
                    if let Err(e) = outbound.send(apology).await {
                        error!(error = %e, "failed to publish outbound message");
                    }
                }
            }
        });

        tx
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
