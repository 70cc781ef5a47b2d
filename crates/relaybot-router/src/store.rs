//! Per-user provider/model selection and wizard state.
//!
//! Records are created lazily by the first write and live for the lifetime
//! of the process. Readers of unknown users get the configured defaults.

use std::collections::HashMap;
use std::sync::RwLock;

use relaybot_providers::Provider;

/// Where a user is in the provider → model selection flow.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WizardState {
    #[default]
    Idle,
    AwaitingProvider,
    AwaitingModel(Provider),
}

impl WizardState {
    pub fn is_active(self) -> bool {
        self != WizardState::Idle
    }
}

/// One user's current selection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserSelection {
    pub provider: Provider,
    pub model: String,
    pub wizard_state: WizardState,
}

/// Storage for per-user selections.
///
/// Getters never fail. The store does not validate provider/model pairs;
/// that is the wizard's job.
pub trait SelectionStore: Send + Sync {
    fn get_provider(&self, user_id: &str) -> Provider;
    fn get_model(&self, user_id: &str) -> String;
    fn get_state(&self, user_id: &str) -> WizardState;

    fn set_provider(&self, user_id: &str, provider: Provider);
    fn set_model(&self, user_id: &str, model: &str);
    fn set_state(&self, user_id: &str, state: WizardState);

    /// Return the user to `Idle` without touching the selection.
    fn reset_state(&self, user_id: &str) {
        self.set_state(user_id, WizardState::Idle);
    }

    /// Set provider, model and `Idle` in one step.
    fn commit(&self, user_id: &str, provider: Provider, model: &str);

    /// Consistent view of all three fields.
    fn snapshot(&self, user_id: &str) -> UserSelection;
}

/// `SelectionStore` backed by a `HashMap` behind a `RwLock`.
pub struct InMemorySelectionStore {
    default_provider: Provider,
    default_model: String,
    users: RwLock<HashMap<String, UserSelection>>,
}

impl InMemorySelectionStore {
    pub fn new(default_provider: Provider, default_model: impl Into<String>) -> Self {
        Self {
            default_provider,
            default_model: default_model.into(),
            users: RwLock::new(HashMap::new()),
        }
    }

    /// Number of users with a stored record.
    pub fn len(&self) -> usize {
        self.users.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn defaults(&self) -> UserSelection {
        UserSelection {
            provider: self.default_provider,
            model: self.default_model.clone(),
            wizard_state: WizardState::Idle,
        }
    }

    fn update(&self, user_id: &str, f: impl FnOnce(&mut UserSelection)) {
        let mut users = self.users.write().unwrap_or_else(|e| e.into_inner());
        let record = users
            .entry(user_id.to_string())
            .or_insert_with(|| self.defaults());
        f(record);
    }
}

impl SelectionStore for InMemorySelectionStore {
    fn get_provider(&self, user_id: &str) -> Provider {
        self.snapshot(user_id).provider
    }

    fn get_model(&self, user_id: &str) -> String {
        self.snapshot(user_id).model
    }

    fn get_state(&self, user_id: &str) -> WizardState {
        self.snapshot(user_id).wizard_state
    }

    fn set_provider(&self, user_id: &str, provider: Provider) {
        self.update(user_id, |r| r.provider = provider);
    }

    fn set_model(&self, user_id: &str, model: &str) {
        self.update(user_id, |r| r.model = model.to_string());
    }

    fn set_state(&self, user_id: &str, state: WizardState) {
        self.update(user_id, |r| r.wizard_state = state);
    }

    fn commit(&self, user_id: &str, provider: Provider, model: &str) {
        self.update(user_id, |r| {
            r.provider = provider;
            r.model = model.to_string();
            r.wizard_state = WizardState::Idle;
        });
    }

    fn snapshot(&self, user_id: &str) -> UserSelection {
        self.users
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(user_id)
            .cloned()
            .unwrap_or_else(|| self.defaults())
    }
}
