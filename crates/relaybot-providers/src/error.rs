//! Typed completion failures.
//!
//! `Display` is the short message relayed to the end user, so it always
//! names the provider and never includes credentials.

use thiserror::Error;

use crate::registry::Provider;

/// Maximum characters of an error body kept for display.
const MAX_BODY_CHARS: usize = 200;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProviderError {
    /// Connect, timeout or send failure. The only retryable kind.
    #[error("Error communicating with {provider}: {message}")]
    Network { provider: Provider, message: String },

    /// The API answered with a non-success status.
    #[error("{provider} API error {status}: {body}")]
    Http {
        provider: Provider,
        status: u16,
        body: String,
    },

    /// The API answered 2xx but the body was not the expected shape.
    #[error("Unexpected response from {provider}: {message}")]
    Parse { provider: Provider, message: String },
}

impl ProviderError {
    pub fn network(provider: Provider, err: impl std::fmt::Display) -> Self {
        ProviderError::Network {
            provider,
            message: err.to_string(),
        }
    }

    /// Build an `Http` error, truncating long bodies.
    pub fn http(provider: Provider, status: u16, body: &str) -> Self {
        ProviderError::Http {
            provider,
            status,
            body: relaybot_core::utils::truncate_string(body.trim(), MAX_BODY_CHARS),
        }
    }

    pub fn parse(provider: Provider, message: impl Into<String>) -> Self {
        ProviderError::Parse {
            provider,
            message: message.into(),
        }
    }

    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderError::Network { .. })
    }

    pub fn provider(&self) -> Provider {
        match self {
            ProviderError::Network { provider, .. }
            | ProviderError::Http { provider, .. }
            | ProviderError::Parse { provider, .. } => *provider,
        }
    }
}
