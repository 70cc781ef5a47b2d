//! Relaybot Core: shared building blocks for every other crate.
//!
//! - **bus**: inbound/outbound event types and the `MessageBus` connecting channels to the router
//! - **config**: typed configuration, JSON + environment loading, startup validation
//! - **utils**: data paths and text helpers (reply chunking, truncation)

pub mod bus;
pub mod config;
pub mod utils;
