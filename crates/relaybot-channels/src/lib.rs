//! Relaybot Channels: chat transport integrations.
//!
//! - **base**: the `Channel` trait every transport implements
//! - **manager**: `ChannelManager`, lifecycle orchestration and outbound routing
//!
//! Transports are feature-gated; `telegram` is the only one shipped.

pub mod base;
pub mod manager;

#[cfg(feature = "telegram")]
pub mod telegram;

pub use base::Channel;
pub use manager::ChannelManager;
