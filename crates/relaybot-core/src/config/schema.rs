//! Configuration schema.
//!
//! Hierarchy: `Config` → `BotConfig`, `ProvidersConfig`, `ChannelsConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//! We use `#[serde(rename_all = "camelCase")]` to handle the conversion.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration: defaults, then `~/.relaybot/config.json`, then env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub bot: BotConfig,
    pub providers: ProvidersConfig,
    pub channels: ChannelsConfig,
}

/// Startup validation failures. Any of these is fatal.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("telegram token is not set (TELEGRAM_TOKEN or channels.telegram.token)")]
    MissingTransportToken,

    #[error("missing API key for {provider} (set {env_var})")]
    MissingCredential {
        provider: &'static str,
        env_var: &'static str,
    },

    #[error("unknown default provider '{0}' (expected deepseek, chatgpt or claude)")]
    UnknownProvider(String),

    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },

    #[error("backoffBase must be a finite number of at least 1.0, got {0}")]
    InvalidBackoff(f64),
}

impl Config {
    /// Check that the configuration can run the bot.
    ///
    /// `require_transport` is set by the gateway; the local REPL needs no
    /// transport token. Every provider must have a credential so any user
    /// selection can be served.
    pub fn validate(&self, require_transport: bool) -> Result<(), ConfigError> {
        if require_transport && self.channels.telegram.token.trim().is_empty() {
            return Err(ConfigError::MissingTransportToken);
        }

        let credentials: [(&ProviderConfig, &'static str, &'static str); 3] = [
            (&self.providers.deepseek, "DeepSeek", "DEEPSEEK_API_KEY"),
            (&self.providers.openai, "ChatGPT", "OPENAI_API_KEY"),
            (&self.providers.anthropic, "Claude", "ANTHROPIC_API_KEY"),
        ];
        for (provider, name, env_var) in credentials {
            if !provider.is_configured() {
                return Err(ConfigError::MissingCredential {
                    provider: name,
                    env_var,
                });
            }
        }

        if self.providers.get_by_name(&self.bot.default_provider).is_none() {
            return Err(ConfigError::UnknownProvider(self.bot.default_provider.clone()));
        }
        if self.bot.max_tokens == 0 {
            return Err(ConfigError::NotPositive { field: "maxTokens" });
        }
        if self.bot.max_attempts == 0 {
            return Err(ConfigError::NotPositive { field: "maxAttempts" });
        }
        if self.bot.chunk_size == 0 {
            return Err(ConfigError::NotPositive { field: "chunkSize" });
        }
        if self.bot.request_timeout_secs == 0 {
            return Err(ConfigError::NotPositive {
                field: "requestTimeoutSecs",
            });
        }
        if !self.bot.backoff_base.is_finite() || self.bot.backoff_base < 1.0 {
            return Err(ConfigError::InvalidBackoff(self.bot.backoff_base));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────
// Bot
// ─────────────────────────────────────────────

/// How selection menus are rendered by chat transports.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuStyle {
    /// Inline buttons carrying callback tokens; menus are edited in place.
    #[default]
    Inline,
    /// One-time reply keyboard of plain labels.
    Keyboard,
}

/// Relay behaviour: defaults, request limits, retry policy, chunking.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BotConfig {
    /// Provider for users who never chose one: `deepseek`, `chatgpt` or `claude`.
    pub default_provider: String,
    /// Model for users who never chose one. `None` = the default provider's default model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
    /// Output token cap sent with every completion request.
    pub max_tokens: u32,
    /// Total attempts per completion when the network fails.
    pub max_attempts: u32,
    /// Backoff base in seconds; the wait before retry k is `backoffBase^(k-1)`.
    pub backoff_base: f64,
    /// Maximum characters per outbound message.
    pub chunk_size: usize,
    /// Per-attempt HTTP timeout.
    pub request_timeout_secs: u64,
    /// Menu rendering for the selection wizard.
    pub menu_style: MenuStyle,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            default_provider: "chatgpt".to_string(),
            default_model: None,
            max_tokens: 1000,
            max_attempts: 3,
            backoff_base: 2.0,
            chunk_size: 4096,
            request_timeout_secs: 30,
            menu_style: MenuStyle::Inline,
        }
    }
}

// ─────────────────────────────────────────────
// Providers
// ─────────────────────────────────────────────

/// Configuration for a single LLM provider.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderConfig {
    /// API key for authentication.
    #[serde(default)]
    pub api_key: String,
    /// Custom API base URL (overrides provider default).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Selectable models, in menu order. Empty = built-in list.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub models: Vec<String>,
    /// Default model for this provider. `None` = first selectable model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl ProviderConfig {
    /// Whether this provider has a configured API key.
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

/// The three supported providers.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub deepseek: ProviderConfig,
    /// ChatGPT.
    #[serde(default)]
    pub openai: ProviderConfig,
    /// Claude.
    #[serde(default)]
    pub anthropic: ProviderConfig,
}

impl ProvidersConfig {
    /// Get a provider config by name. Accepts both product and vendor names
    /// (`"chatgpt"`/`"openai"`, `"claude"`/`"anthropic"`), case-insensitively.
    pub fn get_by_name(&self, name: &str) -> Option<&ProviderConfig> {
        match name.trim().to_lowercase().as_str() {
            "deepseek" => Some(&self.deepseek),
            "chatgpt" | "openai" => Some(&self.openai),
            "claude" | "anthropic" => Some(&self.anthropic),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────
// Channels
// ─────────────────────────────────────────────

/// All channel configurations.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChannelsConfig {
    #[serde(default)]
    pub telegram: TelegramConfig,
}

/// Telegram channel config.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    #[serde(default)]
    pub token: String,
}
