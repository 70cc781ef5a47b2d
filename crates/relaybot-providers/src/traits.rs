//! Completion client trait: one implementation per wire format, plus the
//! retrying wrapper.

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::registry::Provider;

/// Per-request settings shared by every client.
#[derive(Clone, Debug)]
pub struct RequestConfig {
    /// Output token cap sent with every request.
    pub max_tokens: u32,
    /// Per-attempt HTTP timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            max_tokens: 1000,
            timeout_secs: 30,
        }
    }
}

/// A client able to turn a single user prompt into a reply.
///
/// Implementations send exactly one request per call (no history, no
/// retries) and return the whitespace-trimmed reply text.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str, model: &str) -> Result<String, ProviderError>;

    /// The provider this client talks to.
    fn provider(&self) -> Provider;
}
