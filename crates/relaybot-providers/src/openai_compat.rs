//! Completion client for OpenAI-compatible `/chat/completions` APIs.
//!
//! Serves DeepSeek and ChatGPT; only the base URL and key differ.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use relaybot_core::config::ProviderConfig;

use crate::error::ProviderError;
use crate::registry::Provider;
use crate::traits::{CompletionClient, RequestConfig};

// ─────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

// ─────────────────────────────────────────────
// OpenAiCompatClient
// ─────────────────────────────────────────────

/// A client for any OpenAI-compatible chat completions endpoint.
pub struct OpenAiCompatClient {
    /// HTTP client (shared, connection-pooled).
    client: reqwest::Client,
    provider: Provider,
    /// API base URL (e.g. `"https://api.deepseek.com/v1"`).
    api_base: String,
    api_key: String,
    max_tokens: u32,
}

impl std::fmt::Debug for OpenAiCompatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatClient")
            .field("provider", &self.provider)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl OpenAiCompatClient {
    /// Create a client for `provider`; `config.api_base` overrides the
    /// provider's default endpoint.
    pub fn new(provider: Provider, config: &ProviderConfig, request: &RequestConfig) -> Self {
        let api_base = config
            .api_base
            .clone()
            .filter(|b| !b.trim().is_empty())
            .unwrap_or_else(|| provider.spec().default_api_base.to_string());

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(request.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        OpenAiCompatClient {
            client,
            provider,
            api_base,
            api_key: config.api_key.clone(),
            max_tokens: request.max_tokens,
        }
    }

    /// Build the full chat completions URL.
    fn completions_url(&self) -> String {
        let base = self.api_base.trim_end_matches('/');
        format!("{}/chat/completions", base)
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompatClient {
    async fn complete(&self, prompt: &str, model: &str) -> Result<String, ProviderError> {
        let provider = self.provider;
        debug!(
            provider = %provider,
            model = model,
            prompt_chars = prompt.chars().count(),
            "Calling LLM"
        );

        let body = ChatRequest {
            model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = %provider, model = model, error = %e, "HTTP request failed");
                ProviderError::network(provider, e)
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::network(provider, e))?;

        if !status.is_success() {
            error!(
                provider = %provider,
                model = model,
                status = status.as_u16(),
                body = %text,
                "API error"
            );
            return Err(ProviderError::http(provider, status.as_u16(), &text));
        }

        let parsed: ChatResponse = serde_json::from_str(&text).map_err(|e| {
            error!(provider = %provider, model = model, error = %e, "Failed to parse LLM response");
            ProviderError::parse(provider, format!("invalid JSON body: {e}"))
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::parse(provider, "response has no choices"))?
            .message
            .content
            .ok_or_else(|| ProviderError::parse(provider, "response message has no content"))?;

        let reply = content.trim().to_string();
        debug!(provider = %provider, model = model, reply_chars = reply.chars().count(), "LLM response received");
        Ok(reply)
    }

    fn provider(&self) -> Provider {
        self.provider
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
