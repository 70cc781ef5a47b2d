//! LLM provider layer for Relaybot.
//!
//! # Architecture
//!
//! - [`registry`]: the three providers, their static specs and the validated model registry
//! - [`traits::CompletionClient`]: trait that every client implements
//! - [`openai_compat::OpenAiCompatClient`]: DeepSeek and ChatGPT (`/chat/completions`)
//! - [`anthropic::AnthropicClient`]: Claude (`/v1/messages`)
//! - [`retry::RetryingClient`]: bounded retry with exponential backoff on network errors
//! - [`factory::create_clients`]: one retry-wrapped client per configured provider

pub mod anthropic;
pub mod error;
pub mod factory;
pub mod openai_compat;
pub mod registry;
pub mod retry;
pub mod traits;

// Re-export main types for convenience
pub use error::ProviderError;
pub use factory::{create_client, create_clients, ClientMap};
pub use registry::{Provider, ProviderRegistry, ProviderSpec, RegistryError, PROVIDERS};
pub use retry::RetryingClient;
pub use traits::{CompletionClient, RequestConfig};
