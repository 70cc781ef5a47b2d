//! Provider → model selection wizard and the quick-select shortcut.
//!
//! State lives in the [`SelectionStore`]; the wizard only validates input
//! against the [`ProviderRegistry`] and decides the transitions:
//!
//! ```text
//! Idle ──begin──▶ AwaitingProvider ──provider──▶ AwaitingModel(p) ──model──▶ Idle
//!   ▲                                                                       │
//!   └───────────────────────── quick:<p>:<m> (from any state) ◀─────────────┘
//! ```

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use relaybot_core::bus::{ChoiceValue, Menu, MenuButton};
use relaybot_core::config::MenuStyle;
use relaybot_providers::{Provider, ProviderRegistry};

use crate::store::{SelectionStore, WizardState};

/// Telegram's limit on inline-button callback data.
pub const MAX_TOKEN_BYTES: usize = 64;

// ─────────────────────────────────────────────
// Callback tokens
// ─────────────────────────────────────────────

/// Structured choice carried by an inline button.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallbackToken {
    /// `provider:<key>`
    Provider(Provider),
    /// `model:<key>:<model>`
    Model(Provider, String),
    /// `quick:<key>:<model>`
    Quick(Provider, String),
}

impl CallbackToken {
    pub fn encode(&self) -> String {
        match self {
            CallbackToken::Provider(p) => format!("provider:{}", p.key()),
            CallbackToken::Model(p, m) => format!("model:{}:{}", p.key(), m),
            CallbackToken::Quick(p, m) => format!("quick:{}:{}", p.key(), m),
        }
    }

    /// Parse an encoded token. Provider keys must be exact (`chatgpt`, not
    /// `ChatGPT`); model names may contain further `:` characters.
    pub fn parse(raw: &str) -> Option<CallbackToken> {
        let (kind, rest) = raw.split_once(':')?;
        match kind {
            "provider" => provider_by_key(rest).map(CallbackToken::Provider),
            "model" | "quick" => {
                let (key, model) = rest.split_once(':')?;
                let provider = provider_by_key(key)?;
                if model.is_empty() {
                    return None;
                }
                let model = model.to_string();
                Some(if kind == "model" {
                    CallbackToken::Model(provider, model)
                } else {
                    CallbackToken::Quick(provider, model)
                })
            }
            _ => None,
        }
    }
}

fn provider_by_key(key: &str) -> Option<Provider> {
    Provider::ALL.into_iter().find(|p| p.key() == key)
}

// ─────────────────────────────────────────────
// Replies
// ─────────────────────────────────────────────

/// Rejected wizard input. `Display` is the corrective message for the user.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WizardError {
    #[error("{0}")]
    InvalidSelection(String),

    #[error("{0}")]
    OutOfSequence(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WizardOutcome {
    /// Moved to the next step (or showed a menu).
    Advanced,
    /// Selection committed; the wizard is back to `Idle`.
    Completed { provider: Provider, model: String },
    /// Input refused; nothing changed.
    Rejected(WizardError),
}

/// What the wizard wants said to the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WizardReply {
    pub text: String,
    pub menu: Option<Menu>,
    pub outcome: WizardOutcome,
}

impl WizardReply {
    fn advanced(text: String, menu: Option<Menu>) -> Self {
        Self {
            text,
            menu,
            outcome: WizardOutcome::Advanced,
        }
    }

    fn rejected(err: WizardError, menu: Option<Menu>) -> Self {
        Self {
            text: err.to_string(),
            menu,
            outcome: WizardOutcome::Rejected(err),
        }
    }
}

// ─────────────────────────────────────────────
// SelectionWizard
// ─────────────────────────────────────────────

pub struct SelectionWizard {
    store: Arc<dyn SelectionStore>,
    registry: Arc<ProviderRegistry>,
    menu_style: MenuStyle,
}

impl SelectionWizard {
    pub fn new(
        store: Arc<dyn SelectionStore>,
        registry: Arc<ProviderRegistry>,
        menu_style: MenuStyle,
    ) -> Self {
        Self {
            store,
            registry,
            menu_style,
        }
    }

    /// Start (or restart) the wizard for `user_id`.
    pub fn begin(&self, user_id: &str) -> WizardReply {
        self.store.set_state(user_id, WizardState::AwaitingProvider);
        debug!(user = user_id, "wizard started");
        WizardReply::advanced(
            "First, choose a provider:".to_string(),
            Some(self.provider_menu()),
        )
    }

    /// Feed a menu choice into the wizard.
    pub fn choose(&self, user_id: &str, value: &ChoiceValue) -> WizardReply {
        let state = self.store.get_state(user_id);

        let token = match value {
            ChoiceValue::Token(raw) => match CallbackToken::parse(raw) {
                Some(token) => Some(token),
                None => {
                    warn!(user = user_id, token = %raw, "unrecognized callback token");
                    return WizardReply::rejected(
                        WizardError::InvalidSelection(
                            "That option is no longer available. Use /choose_model to start again."
                                .to_string(),
                        ),
                        None,
                    );
                }
            },
            ChoiceValue::Label(_) => None,
        };

        if let Some(CallbackToken::Quick(provider, model)) = &token {
            return self.quick_select(user_id, *provider, model);
        }

        match state {
            WizardState::Idle => WizardReply::rejected(
                WizardError::OutOfSequence(
                    "No selection in progress. Use /choose_model to pick a provider and model."
                        .to_string(),
                ),
                None,
            ),
            WizardState::AwaitingProvider => {
                let provider = match (&token, value) {
                    (Some(CallbackToken::Provider(p)), _) => Some(*p),
                    (None, ChoiceValue::Label(label)) => Provider::from_label(label),
                    _ => None,
                };
                match provider {
                    Some(p) => self.provider_chosen(user_id, p),
                    None => WizardReply::rejected(
                        WizardError::InvalidSelection(format!(
                            "Please choose one of the providers: {}.",
                            provider_labels()
                        )),
                        Some(self.provider_menu()),
                    ),
                }
            }
            WizardState::AwaitingModel(provider) => {
                let model = match (&token, value) {
                    (Some(CallbackToken::Model(p, m)), _) if *p == provider => Some(m.as_str()),
                    (None, ChoiceValue::Label(label)) => Some(label.as_str()),
                    _ => None,
                };
                match model {
                    Some(m) if self.registry.contains(provider, m) => {
                        self.store.commit(user_id, provider, m);
                        info!(user = user_id, provider = %provider, model = m, "selection committed");
                        self.completed(provider, m)
                    }
                    _ => WizardReply::rejected(
                        WizardError::InvalidSelection(format!(
                            "Please choose one of the {} models: {}.",
                            provider,
                            self.registry.models(provider).join(", ")
                        )),
                        Some(self.model_menu(provider)),
                    ),
                }
            }
        }
    }

    /// Menu of every provider/model pair for one-tap switching.
    ///
    /// Always inline: quick-select entries are tokens, not typed labels.
    pub fn quick_menu(&self) -> WizardReply {
        let buttons = Provider::ALL
            .into_iter()
            .flat_map(|p| {
                self.registry
                    .models(p)
                    .iter()
                    .map(move |m| (p, m.clone()))
            })
            .filter_map(|(p, m)| {
                let label = format!("{} · {}", p, m);
                button(label, CallbackToken::Quick(p, m))
            })
            .collect();
        WizardReply::advanced(
            "Pick a provider and model:".to_string(),
            Some(Menu::Inline(buttons)),
        )
    }

    /// Whether `text` is exactly a label the wizard's menus can show.
    pub fn is_menu_label(&self, text: &str) -> bool {
        Provider::from_label(text).is_some() || self.registry.is_model_name(text)
    }

    fn quick_select(&self, user_id: &str, provider: Provider, model: &str) -> WizardReply {
        if !self.registry.contains(provider, model) {
            return WizardReply::rejected(
                WizardError::InvalidSelection(format!(
                    "{} does not offer model {}. Use /quick_select to see the options.",
                    provider, model
                )),
                None,
            );
        }
        self.store.commit(user_id, provider, model);
        info!(user = user_id, provider = %provider, model = model, "quick selection committed");
        self.completed(provider, model)
    }

    fn provider_chosen(&self, user_id: &str, provider: Provider) -> WizardReply {
        self.store.set_provider(user_id, provider);
        self.store
            .set_state(user_id, WizardState::AwaitingModel(provider));
        debug!(user = user_id, provider = %provider, "provider chosen");
        WizardReply::advanced(
            format!("Now choose a {} model:", provider),
            Some(self.model_menu(provider)),
        )
    }

    fn completed(&self, provider: Provider, model: &str) -> WizardReply {
        WizardReply {
            text: format!("Model selected: {} ({}).", model, provider),
            menu: None,
            outcome: WizardOutcome::Completed {
                provider,
                model: model.to_string(),
            },
        }
    }

    fn provider_menu(&self) -> Menu {
        match self.menu_style {
            MenuStyle::Keyboard => {
                Menu::Keyboard(Provider::ALL.iter().map(|p| p.label().to_string()).collect())
            }
            MenuStyle::Inline => Menu::Inline(
                Provider::ALL
                    .into_iter()
                    .filter_map(|p| button(p.label().to_string(), CallbackToken::Provider(p)))
                    .collect(),
            ),
        }
    }

    fn model_menu(&self, provider: Provider) -> Menu {
        let models = self.registry.models(provider);
        match self.menu_style {
            MenuStyle::Keyboard => Menu::Keyboard(models.to_vec()),
            MenuStyle::Inline => Menu::Inline(
                models
                    .iter()
                    .filter_map(|m| button(m.clone(), CallbackToken::Model(provider, m.clone())))
                    .collect(),
            ),
        }
    }
}

/// An inline button, or `None` if its token exceeds the callback data limit.
fn button(label: String, token: CallbackToken) -> Option<MenuButton> {
    let encoded = token.encode();
    if encoded.len() > MAX_TOKEN_BYTES {
        warn!(token = %encoded, "callback token too long, skipping menu entry");
        return None;
    }
    Some(MenuButton::new(label, encoded))
}

fn provider_labels() -> String {
    Provider::ALL
        .iter()
        .map(|p| p.label())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemorySelectionStore;
    use relaybot_core::config::Config;

    const USER: &str = "telegram:42";

    fn wizard_with(style: MenuStyle) -> (SelectionWizard, Arc<InMemorySelectionStore>) {
        let registry = Arc::new(ProviderRegistry::builtin());
        let store = Arc::new(InMemorySelectionStore::new(
            registry.default_provider(),
            registry.default_model(),
        ));
        let wizard = SelectionWizard::new(store.clone(), registry, style);
        (wizard, store)
    }

    fn wizard() -> (SelectionWizard, Arc<InMemorySelectionStore>) {
        wizard_with(MenuStyle::Inline)
    }

    fn label(s: &str) -> ChoiceValue {
        ChoiceValue::Label(s.to_string())
    }

    fn token(s: &str) -> ChoiceValue {
        ChoiceValue::Token(s.to_string())
    }

    // ── Tokens ──

    #[test]
    fn test_token_encode_parse() {
        for t in [
            CallbackToken::Provider(Provider::Claude),
            CallbackToken::Model(Provider::ChatGpt, "gpt-4o-mini".into()),
            CallbackToken::Quick(Provider::DeepSeek, "deepseek-reasoner".into()),
        ] {
            assert_eq!(CallbackToken::parse(&t.encode()), Some(t));
        }
        assert_eq!(
            CallbackToken::Model(Provider::ChatGpt, "gpt-4o".into()).encode(),
            "model:chatgpt:gpt-4o"
        );
    }

    #[test]
    fn test_token_model_may_contain_colon() {
        assert_eq!(
            CallbackToken::parse("model:deepseek:ft:custom"),
            Some(CallbackToken::Model(Provider::DeepSeek, "ft:custom".into()))
        );
    }

    #[test]
    fn test_token_malformed() {
        for raw in [
            "",
            "provider",
            "provider:gemini",
            "provider:ChatGPT",
            "model:chatgpt",
            "model:chatgpt:",
            "quick::gpt-4o",
            "delete:chatgpt:gpt-4o",
        ] {
            assert_eq!(CallbackToken::parse(raw), None, "{raw}");
        }
    }

    #[test]
    fn test_builtin_tokens_fit_limit() {
        let registry = ProviderRegistry::builtin();
        for p in Provider::ALL {
            for m in registry.models(p) {
                assert!(CallbackToken::Quick(p, m.clone()).encode().len() <= MAX_TOKEN_BYTES);
            }
        }
    }

    // ── Full flows ──

    #[test]
    fn test_begin_shows_provider_menu() {
        let (wizard, store) = wizard();
        let reply = wizard.begin(USER);
        assert_eq!(reply.outcome, WizardOutcome::Advanced);
        assert_eq!(store.get_state(USER), WizardState::AwaitingProvider);
        let menu = reply.menu.unwrap();
        assert_eq!(menu.labels(), vec!["DeepSeek", "ChatGPT", "Claude"]);
        assert_eq!(menu.pick(2), Some(token("provider:claude")));
    }

    #[test]
    fn test_flow_with_tokens() {
        let (wizard, store) = wizard();
        wizard.begin(USER);

        let reply = wizard.choose(USER, &token("provider:chatgpt"));
        assert_eq!(reply.outcome, WizardOutcome::Advanced);
        assert_eq!(store.get_state(USER), WizardState::AwaitingModel(Provider::ChatGpt));
        assert_eq!(
            reply.menu.unwrap().labels(),
            vec!["gpt-4o", "gpt-4o-mini", "gpt-3.5-turbo"]
        );

        let reply = wizard.choose(USER, &token("model:chatgpt:gpt-4o-mini"));
        assert_eq!(
            reply.outcome,
            WizardOutcome::Completed {
                provider: Provider::ChatGpt,
                model: "gpt-4o-mini".into()
            }
        );
        assert!(reply.text.contains("gpt-4o-mini"));
        let sel = store.snapshot(USER);
        assert_eq!(sel.model, "gpt-4o-mini");
        assert_eq!(sel.wizard_state, WizardState::Idle);
    }

    #[test]
    fn test_flow_with_labels_keyboard_style() {
        let (wizard, store) = wizard_with(MenuStyle::Keyboard);
        let reply = wizard.begin(USER);
        assert_eq!(
            reply.menu,
            Some(Menu::Keyboard(vec![
                "DeepSeek".into(),
                "ChatGPT".into(),
                "Claude".into()
            ]))
        );

        wizard.choose(USER, &label("DeepSeek"));
        // Provider is set as soon as it is chosen
        assert_eq!(store.get_provider(USER), Provider::DeepSeek);

        let reply = wizard.choose(USER, &label("deepseek-reasoner"));
        assert!(matches!(reply.outcome, WizardOutcome::Completed { .. }));
        assert_eq!(store.get_model(USER), "deepseek-reasoner");
        assert_eq!(store.get_state(USER), WizardState::Idle);
    }

    #[test]
    fn test_model_from_other_provider_rejected() {
        let (wizard, store) = wizard();
        wizard.begin(USER);
        wizard.choose(USER, &label("Claude"));

        let before = store.snapshot(USER);
        for input in [
            label("gpt-4o"),
            label("ChatGPT"),
            token("model:chatgpt:gpt-4o"),
            token("provider:deepseek"),
        ] {
            let reply = wizard.choose(USER, &input);
            assert!(
                matches!(reply.outcome, WizardOutcome::Rejected(WizardError::InvalidSelection(_))),
                "{input:?}"
            );
            // The model menu is offered again
            assert_eq!(reply.menu.as_ref().map(Menu::len), Some(3));
        }
        assert_eq!(store.snapshot(USER), before);
    }

    #[test]
    fn test_invalid_provider_rejected() {
        let (wizard, store) = wizard();
        wizard.begin(USER);
        let before = store.snapshot(USER);

        for input in [
            label("gpt-4o"),
            token("model:chatgpt:gpt-4o"),
            token("model:claude:claude-3-opus-latest"),
        ] {
            let reply = wizard.choose(USER, &input);
            assert!(
                matches!(reply.outcome, WizardOutcome::Rejected(WizardError::InvalidSelection(_))),
                "{input:?}"
            );
            assert!(reply.text.contains("DeepSeek, ChatGPT, Claude"));
            assert_eq!(store.snapshot(USER), before, "{input:?}");
        }
        assert_eq!(before.wizard_state, WizardState::AwaitingProvider);
    }

    #[test]
    fn test_choice_while_idle_is_out_of_sequence() {
        let (wizard, store) = wizard();
        let reply = wizard.choose(USER, &token("model:claude:claude-3-opus-latest"));
        assert!(matches!(
            reply.outcome,
            WizardOutcome::Rejected(WizardError::OutOfSequence(_))
        ));
        assert_eq!(store.get_model(USER), "gpt-4o");
        assert!(store.is_empty());
    }

    #[test]
    fn test_begin_restarts_from_any_state() {
        let (wizard, store) = wizard();
        wizard.begin(USER);
        wizard.choose(USER, &label("Claude"));
        wizard.begin(USER);
        assert_eq!(store.get_state(USER), WizardState::AwaitingProvider);
    }

    #[test]
    fn test_unknown_token_rejected() {
        let (wizard, store) = wizard();
        wizard.begin(USER);
        let reply = wizard.choose(USER, &token("garbage"));
        assert!(matches!(reply.outcome, WizardOutcome::Rejected(_)));
        assert_eq!(store.get_state(USER), WizardState::AwaitingProvider);
    }

    // ── Quick select ──

    #[test]
    fn test_quick_menu_lists_all_pairs() {
        let (wizard, _) = wizard_with(MenuStyle::Keyboard);
        let menu = wizard.quick_menu().menu.unwrap();
        assert!(matches!(menu, Menu::Inline(_)));
        assert_eq!(menu.len(), 8);
        assert_eq!(menu.labels()[0], "DeepSeek · deepseek-chat");
        assert_eq!(menu.pick(7), Some(token("quick:claude:claude-3-opus-latest")));
    }

    #[test]
    fn test_quick_select_from_any_state() {
        let (wizard, store) = wizard();
        wizard.begin(USER);
        wizard.choose(USER, &label("ChatGPT"));

        let reply = wizard.choose(USER, &token("quick:claude:claude-3-5-haiku-latest"));
        assert!(matches!(reply.outcome, WizardOutcome::Completed { .. }));
        let sel = store.snapshot(USER);
        assert_eq!(sel.provider, Provider::Claude);
        assert_eq!(sel.model, "claude-3-5-haiku-latest");
        assert_eq!(sel.wizard_state, WizardState::Idle);
    }

    #[test]
    fn test_quick_select_validates_pair() {
        let (wizard, store) = wizard();
        let reply = wizard.choose(USER, &token("quick:deepseek:gpt-4o"));
        assert!(matches!(reply.outcome, WizardOutcome::Rejected(_)));
        assert_eq!(store.get_provider(USER), Provider::ChatGpt);
    }

    #[test]
    fn test_configured_models_drive_menus() {
        let mut config = Config::default();
        config.providers.anthropic.models = vec!["claude-sonnet-4".into()];
        let registry = Arc::new(ProviderRegistry::from_config(&config).unwrap());
        let store = Arc::new(InMemorySelectionStore::new(Provider::ChatGpt, "gpt-4o"));
        let wizard = SelectionWizard::new(store, registry, MenuStyle::Inline);

        wizard.begin(USER);
        let reply = wizard.choose(USER, &label("Claude"));
        assert_eq!(reply.menu.unwrap().labels(), vec!["claude-sonnet-4"]);
        assert!(wizard.is_menu_label("claude-sonnet-4"));
        assert!(!wizard.is_menu_label("claude-3-opus-latest"));
    }

    #[test]
    fn test_long_tokens_are_skipped() {
        let mut config = Config::default();
        let long = "m".repeat(70);
        config.providers.deepseek.models = vec!["deepseek-chat".into(), long];
        let registry = Arc::new(ProviderRegistry::from_config(&config).unwrap());
        let store = Arc::new(InMemorySelectionStore::new(Provider::ChatGpt, "gpt-4o"));
        let wizard = SelectionWizard::new(store, registry, MenuStyle::Inline);

        wizard.begin(USER);
        let reply = wizard.choose(USER, &token("provider:deepseek"));
        assert_eq!(reply.menu.unwrap().labels(), vec!["deepseek-chat"]);
    }
}
