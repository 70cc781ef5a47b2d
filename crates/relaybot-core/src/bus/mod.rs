//! Message bus: event types and the bounded queues between channels and the router.

pub mod queue;
pub mod types;

pub use queue::MessageBus;
pub use types::{ChoiceValue, InboundKind, InboundMessage, Menu, MenuButton, OutboundKind, OutboundMessage};
