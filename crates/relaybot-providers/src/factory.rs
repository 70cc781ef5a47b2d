//! Build the retry-wrapped client for every provider from configuration.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use relaybot_core::config::{Config, ProviderConfig};

use crate::anthropic::AnthropicClient;
use crate::openai_compat::OpenAiCompatClient;
use crate::registry::{Provider, WireFormat};
use crate::retry::RetryingClient;
use crate::traits::{CompletionClient, RequestConfig};

/// Provider → client map handed to the dispatcher.
pub type ClientMap = HashMap<Provider, Arc<dyn CompletionClient>>;

/// Create the bare (non-retrying) client for one provider.
pub fn create_client(
    provider: Provider,
    config: &ProviderConfig,
    request: &RequestConfig,
) -> Box<dyn CompletionClient> {
    let spec = provider.spec();
    debug!(
        provider = spec.display_name,
        api_base = config.api_base.as_deref().unwrap_or(spec.default_api_base),
        "Creating LLM client"
    );
    match spec.wire {
        WireFormat::OpenAiCompatible => Box::new(OpenAiCompatClient::new(provider, config, request)),
        WireFormat::AnthropicMessages => Box::new(AnthropicClient::new(config, request)),
    }
}

/// Create a retry-wrapped client for each provider that has an API key.
///
/// Providers without a key are left out; the dispatcher answers users of
/// such a provider with an error message. Startup validation normally
/// guarantees all three are present.
pub fn create_clients(config: &Config) -> ClientMap {
    let request = RequestConfig {
        max_tokens: config.bot.max_tokens,
        timeout_secs: config.bot.request_timeout_secs,
    };

    Provider::ALL
        .into_iter()
        .filter_map(|provider| {
            let pc = config.providers.get_by_name(provider.spec().config_name)?;
            if !pc.is_configured() {
                return None;
            }
            let client = RetryingClient::new(create_client(provider, pc, &request))
                .with_max_attempts(config.bot.max_attempts)
                .with_backoff_base(config.bot.backoff_base);
            Some((provider, Arc::new(client) as Arc<dyn CompletionClient>))
        })
        .collect()
}
