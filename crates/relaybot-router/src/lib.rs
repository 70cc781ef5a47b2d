//! Relaybot router: everything between an inbound event and its replies.
//!
//! This crate contains:
//! - **store**: per-user provider/model selection and wizard state
//! - **wizard**: the provider → model selection state machine and quick select
//! - **dispatcher**: relays prompts to the selected provider and chunks replies
//! - **router**: command handling and per-user ordered processing of the bus

pub mod dispatcher;
pub mod router;
pub mod store;
pub mod texts;
pub mod wizard;

pub use dispatcher::Dispatcher;
pub use router::BotRouter;
pub use store::{InMemorySelectionStore, SelectionStore, UserSelection, WizardState};
pub use wizard::{CallbackToken, SelectionWizard, WizardError, WizardOutcome, WizardReply};
