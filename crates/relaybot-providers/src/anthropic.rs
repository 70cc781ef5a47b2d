//! Completion client for the Anthropic Messages API (Claude).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use relaybot_core::config::ProviderConfig;

use crate::error::ProviderError;
use crate::registry::Provider;
use crate::traits::{CompletionClient, RequestConfig};

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [UserMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

/// Claude client speaking `POST {base}/v1/messages`.
pub struct AnthropicClient {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    max_tokens: u32,
}

impl std::fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl AnthropicClient {
    pub fn new(config: &ProviderConfig, request: &RequestConfig) -> Self {
        let api_base = config
            .api_base
            .clone()
            .filter(|b| !b.trim().is_empty())
            .unwrap_or_else(|| Provider::Claude.spec().default_api_base.to_string());

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(request.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            api_base,
            api_key: config.api_key.clone(),
            max_tokens: request.max_tokens,
        }
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl CompletionClient for AnthropicClient {
    async fn complete(&self, prompt: &str, model: &str) -> Result<String, ProviderError> {
        let provider = Provider::Claude;
        debug!(
            provider = %provider,
            model = model,
            prompt_chars = prompt.chars().count(),
            "Calling LLM"
        );

        let body = MessagesRequest {
            model,
            max_tokens: self.max_tokens,
            messages: [UserMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
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

        let parsed: MessagesResponse = serde_json::from_str(&text).map_err(|e| {
            error!(provider = %provider, model = model, error = %e, "Failed to parse LLM response");
            ProviderError::parse(provider, format!("invalid JSON body: {e}"))
        })?;

        let text = parsed
            .content
            .into_iter()
            .find(|block| block.block_type == "text")
            .and_then(|block| block.text)
            .ok_or_else(|| ProviderError::parse(provider, "response has no text content"))?;

        let reply = text.trim().to_string();
        debug!(provider = %provider, model = model, reply_chars = reply.chars().count(), "LLM response received");
        Ok(reply)
    }

    fn provider(&self) -> Provider {
        Provider::Claude
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_client(api_base: &str) -> AnthropicClient {
        let config = ProviderConfig {
            api_key: "sk-ant-test".to_string(),
            api_base: Some(api_base.to_string()),
            ..Default::default()
        };
        let request = RequestConfig {
            max_tokens: 256,
            timeout_secs: 5,
        };
        AnthropicClient::new(&config, &request)
    }

    #[test]
    fn test_messages_url() {
        let client = make_client("https://api.anthropic.com/");
        assert_eq!(client.messages_url(), "https://api.anthropic.com/v1/messages");
    }

    #[tokio::test]
    async fn test_complete_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "sk-ant-test"))
            .and(header("anthropic-version", "2023-06-01"))
            .and(body_partial_json(serde_json::json!({
                "model": "claude-3-5-haiku-latest",
                "max_tokens": 256,
                "messages": [{ "role": "user", "content": "Hi" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "msg_01",
                "type": "message",
                "role": "assistant",
                "content": [
                    { "type": "thinking", "thinking": "..." },
                    { "type": "text", "text": "\nHello from Claude. " }
                ],
                "stop_reason": "end_turn"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = make_client(&mock_server.uri());
        let reply = client.complete("Hi", "claude-3-5-haiku-latest").await.unwrap();
        assert_eq!(reply, "Hello from Claude.");
    }

    #[tokio::test]
    async fn test_complete_overloaded() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(529).set_body_json(serde_json::json!({
                "type": "error",
                "error": { "type": "overloaded_error", "message": "Overloaded" }
            })))
            .mount(&mock_server)
            .await;

        let client = make_client(&mock_server.uri());
        let err = client.complete("Hi", "claude-3-opus-latest").await.unwrap_err();
        assert!(matches!(err, ProviderError::Http { status: 529, .. }));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_complete_without_text_block() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": []
            })))
            .mount(&mock_server)
            .await;

        let client = make_client(&mock_server.uri());
        let err = client.complete("Hi", "claude-3-opus-latest").await.unwrap_err();
        assert!(matches!(err, ProviderError::Parse { provider: Provider::Claude, .. }));
    }

    #[tokio::test]
    async fn test_complete_network_error() {
        let client = make_client("http://127.0.0.1:1");
        let err = client.complete("Hi", "claude-3-opus-latest").await.unwrap_err();
        assert!(matches!(err, ProviderError::Network { .. }));
    }
}
