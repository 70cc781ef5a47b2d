//! Provider registry: the three supported providers and their model sets.
//!
//! `PROVIDERS` holds the static spec for each provider (wire flavour, default
//! endpoint, built-in models). `ProviderRegistry` is the validated,
//! process-wide view built from configuration at startup.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use relaybot_core::config::Config;

// ─────────────────────────────────────────────
// Provider
// ─────────────────────────────────────────────

/// One of the supported LLM providers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Provider {
    DeepSeek,
    ChatGpt,
    Claude,
}

impl Provider {
    /// All providers, in menu order.
    pub const ALL: [Provider; 3] = [Provider::DeepSeek, Provider::ChatGpt, Provider::Claude];

    /// Stable lowercase key used in callback tokens and config (`"chatgpt"`).
    pub fn key(self) -> &'static str {
        match self {
            Provider::DeepSeek => "deepseek",
            Provider::ChatGpt => "chatgpt",
            Provider::Claude => "claude",
        }
    }

    /// Menu label shown to users (`"ChatGPT"`).
    pub fn label(self) -> &'static str {
        self.spec().display_name
    }

    /// Parse a key, label or vendor name, case-insensitively.
    pub fn parse(s: &str) -> Option<Provider> {
        match s.trim().to_lowercase().as_str() {
            "deepseek" => Some(Provider::DeepSeek),
            "chatgpt" | "openai" => Some(Provider::ChatGpt),
            "claude" | "anthropic" => Some(Provider::Claude),
            _ => None,
        }
    }

    /// Exact menu-label match (`"DeepSeek"`, `"ChatGPT"`, `"Claude"`).
    pub fn from_label(label: &str) -> Option<Provider> {
        Provider::ALL.into_iter().find(|p| p.label() == label)
    }

    /// Static spec for this provider.
    pub fn spec(self) -> &'static ProviderSpec {
        match self {
            Provider::DeepSeek => &PROVIDERS[0],
            Provider::ChatGpt => &PROVIDERS[1],
            Provider::Claude => &PROVIDERS[2],
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ─────────────────────────────────────────────
// ProviderSpec: static metadata for one provider
// ─────────────────────────────────────────────

/// Request/response format spoken by a provider's HTTP API.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WireFormat {
    /// `POST {base}/chat/completions` with bearer auth.
    OpenAiCompatible,
    /// `POST {base}/v1/messages` with `x-api-key`.
    AnthropicMessages,
}

/// Static specification describing one LLM provider.
#[derive(Clone, Debug)]
pub struct ProviderSpec {
    pub provider: Provider,
    /// Section name under `providers` in the config file.
    pub config_name: &'static str,
    /// Human-readable name for menus and logs.
    pub display_name: &'static str,
    /// Conventional environment variable for the API key.
    pub env_key: &'static str,
    pub wire: WireFormat,
    pub default_api_base: &'static str,
    /// Built-in selectable models, in menu order.
    pub models: &'static [&'static str],
    pub default_model: &'static str,
}

/// Specs for every supported provider, in `Provider::ALL` order.
pub static PROVIDERS: [ProviderSpec; 3] = [
    ProviderSpec {
        provider: Provider::DeepSeek,
        config_name: "deepseek",
        display_name: "DeepSeek",
        env_key: "DEEPSEEK_API_KEY",
        wire: WireFormat::OpenAiCompatible,
        default_api_base: "https://api.deepseek.com/v1",
        models: &["deepseek-chat", "deepseek-reasoner"],
        default_model: "deepseek-chat",
    },
    ProviderSpec {
        provider: Provider::ChatGpt,
        config_name: "openai",
        display_name: "ChatGPT",
        env_key: "OPENAI_API_KEY",
        wire: WireFormat::OpenAiCompatible,
        default_api_base: "https://api.openai.com/v1",
        models: &["gpt-4o", "gpt-4o-mini", "gpt-3.5-turbo"],
        default_model: "gpt-4o",
    },
    ProviderSpec {
        provider: Provider::Claude,
        config_name: "anthropic",
        display_name: "Claude",
        env_key: "ANTHROPIC_API_KEY",
        wire: WireFormat::AnthropicMessages,
        default_api_base: "https://api.anthropic.com",
        models: &[
            "claude-3-5-sonnet-latest",
            "claude-3-5-haiku-latest",
            "claude-3-opus-latest",
        ],
        default_model: "claude-3-5-sonnet-latest",
    },
];

// ─────────────────────────────────────────────
// ProviderRegistry
// ─────────────────────────────────────────────

/// Invalid provider/model configuration. Fatal at startup.
#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    #[error("unknown provider '{0}'")]
    UnknownProvider(String),

    #[error("{provider} has no selectable models")]
    EmptyModelList { provider: Provider },

    #[error("{provider} lists model '{model}' more than once")]
    DuplicateModel { provider: Provider, model: String },

    #[error("default model '{model}' is not offered by {provider}")]
    UnknownDefaultModel { provider: Provider, model: String },
}

/// Selectable models for one provider.
#[derive(Clone, Debug)]
struct ModelSet {
    models: Vec<String>,
    default_model: String,
}

/// Validated, immutable provider → models mapping plus the bot-wide default
/// selection for users who never chose one.
#[derive(Clone, Debug)]
pub struct ProviderRegistry {
    sets: HashMap<Provider, ModelSet>,
    default_provider: Provider,
    default_model: String,
}

impl ProviderRegistry {
    /// Built-in model lists with ChatGPT / gpt-4o as the default selection.
    pub fn builtin() -> Self {
        let sets = PROVIDERS
            .iter()
            .map(|spec| {
                let set = ModelSet {
                    models: spec.models.iter().map(|m| m.to_string()).collect(),
                    default_model: spec.default_model.to_string(),
                };
                (spec.provider, set)
            })
            .collect();
        Self {
            sets,
            default_provider: Provider::ChatGpt,
            default_model: Provider::ChatGpt.spec().default_model.to_string(),
        }
    }

    /// Build from configuration: per-provider `models`/`defaultModel`
    /// overrides and the `bot.defaultProvider`/`bot.defaultModel` selection.
    pub fn from_config(config: &Config) -> Result<Self, RegistryError> {
        let mut sets = HashMap::new();

        for spec in PROVIDERS.iter() {
            let provider = spec.provider;
            let overrides = config.providers.get_by_name(spec.config_name);

            let models: Vec<String> = match overrides {
                Some(pc) if !pc.models.is_empty() => pc.models.iter().map(|m| m.trim().to_string()).collect(),
                _ => spec.models.iter().map(|m| m.to_string()).collect(),
            };
            if models.is_empty() || models.iter().any(|m| m.is_empty()) {
                return Err(RegistryError::EmptyModelList { provider });
            }
            for (i, model) in models.iter().enumerate() {
                if models[..i].contains(model) {
                    return Err(RegistryError::DuplicateModel {
                        provider,
                        model: model.clone(),
                    });
                }
            }

            let default_model = overrides
                .and_then(|pc| pc.default_model.clone())
                .unwrap_or_else(|| {
                    if models.iter().any(|m| m == spec.default_model) {
                        spec.default_model.to_string()
                    } else {
                        models[0].clone()
                    }
                });
            if !models.contains(&default_model) {
                return Err(RegistryError::UnknownDefaultModel {
                    provider,
                    model: default_model,
                });
            }

            sets.insert(
                provider,
                ModelSet {
                    models,
                    default_model,
                },
            );
        }

        let default_provider = Provider::parse(&config.bot.default_provider)
            .ok_or_else(|| RegistryError::UnknownProvider(config.bot.default_provider.clone()))?;

        let mut registry = Self {
            sets,
            default_provider,
            default_model: String::new(),
        };
        let default_model = config
            .bot
            .default_model
            .clone()
            .unwrap_or_else(|| registry.default_model_for(default_provider).to_string());
        if !registry.contains(default_provider, &default_model) {
            return Err(RegistryError::UnknownDefaultModel {
                provider: default_provider,
                model: default_model,
            });
        }
        registry.default_model = default_model;

        Ok(registry)
    }

    /// Selectable models for `provider`, in menu order.
    pub fn models(&self, provider: Provider) -> &[String] {
        self.sets
            .get(&provider)
            .map(|s| s.models.as_slice())
            .unwrap_or(&[])
    }

    /// The provider's own default model.
    pub fn default_model_for(&self, provider: Provider) -> &str {
        self.sets
            .get(&provider)
            .map(|s| s.default_model.as_str())
            .unwrap_or(provider.spec().default_model)
    }

    /// Whether `model` is selectable for `provider`.
    pub fn contains(&self, provider: Provider, model: &str) -> bool {
        self.models(provider).iter().any(|m| m == model)
    }

    /// Whether `name` is a selectable model of any provider.
    pub fn is_model_name(&self, name: &str) -> bool {
        Provider::ALL.into_iter().any(|p| self.contains(p, name))
    }

    /// Provider for users who never chose one.
    pub fn default_provider(&self) -> Provider {
        self.default_provider
    }

    /// Model for users who never chose one.
    pub fn default_model(&self) -> &str {
        &self.default_model
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_keys_and_labels() {
        assert_eq!(Provider::ChatGpt.key(), "chatgpt");
        assert_eq!(Provider::ChatGpt.label(), "ChatGPT");
        assert_eq!(Provider::Claude.to_string(), "Claude");
        assert_eq!(Provider::DeepSeek.spec().env_key, "DEEPSEEK_API_KEY");
    }

    #[test]
    fn test_provider_parse() {
        assert_eq!(Provider::parse("DeepSeek"), Some(Provider::DeepSeek));
        assert_eq!(Provider::parse("openai"), Some(Provider::ChatGpt));
        assert_eq!(Provider::parse(" anthropic "), Some(Provider::Claude));
        assert_eq!(Provider::parse("gemini"), None);
    }

    #[test]
    fn test_from_label_is_exact() {
        assert_eq!(Provider::from_label("Claude"), Some(Provider::Claude));
        assert_eq!(Provider::from_label("claude"), None);
    }

    #[test]
    fn test_specs_match_provider_order() {
        for (spec, provider) in PROVIDERS.iter().zip(Provider::ALL) {
            assert_eq!(spec.provider, provider);
            assert!(spec.models.contains(&spec.default_model));
        }
    }

    #[test]
    fn test_builtin_registry() {
        let registry = ProviderRegistry::builtin();
        assert_eq!(registry.default_provider(), Provider::ChatGpt);
        assert_eq!(registry.default_model(), "gpt-4o");
        assert_eq!(
            registry.models(Provider::DeepSeek),
            &["deepseek-chat".to_string(), "deepseek-reasoner".to_string()]
        );
        assert!(registry.contains(Provider::Claude, "claude-3-opus-latest"));
        assert!(!registry.contains(Provider::Claude, "gpt-4o"));
    }

    #[test]
    fn test_from_default_config_matches_builtin() {
        let registry = ProviderRegistry::from_config(&Config::default()).unwrap();
        assert_eq!(registry.default_provider(), Provider::ChatGpt);
        assert_eq!(registry.default_model(), "gpt-4o");
        assert_eq!(registry.models(Provider::ChatGpt).len(), 3);
    }

    #[test]
    fn test_from_config_custom_models() {
        let mut config = Config::default();
        config.providers.deepseek.models = vec!["deepseek-coder".into(), "deepseek-chat".into()];
        config.bot.default_provider = "deepseek".into();

        let registry = ProviderRegistry::from_config(&config).unwrap();
        assert_eq!(registry.default_provider(), Provider::DeepSeek);
        // Built-in default still listed → kept
        assert_eq!(registry.default_model(), "deepseek-chat");
        assert!(registry.is_model_name("deepseek-coder"));
    }

    #[test]
    fn test_from_config_falls_back_to_first_model() {
        let mut config = Config::default();
        config.providers.openai.models = vec!["gpt-4.1".into(), "o3-mini".into()];
        let registry = ProviderRegistry::from_config(&config).unwrap();
        assert_eq!(registry.default_model_for(Provider::ChatGpt), "gpt-4.1");
        assert_eq!(registry.default_model(), "gpt-4.1");
    }

    #[test]
    fn test_from_config_rejects_foreign_default_model() {
        let mut config = Config::default();
        config.bot.default_provider = "claude".into();
        config.bot.default_model = Some("gpt-4o".into());
        let err = ProviderRegistry::from_config(&config).unwrap_err();
        assert_eq!(
            err,
            RegistryError::UnknownDefaultModel {
                provider: Provider::Claude,
                model: "gpt-4o".into()
            }
        );
    }

    #[test]
    fn test_from_config_rejects_bad_provider_default() {
        let mut config = Config::default();
        config.providers.anthropic.default_model = Some("claude-2".into());
        assert!(matches!(
            ProviderRegistry::from_config(&config),
            Err(RegistryError::UnknownDefaultModel {
                provider: Provider::Claude,
                ..
            })
        ));
    }

    #[test]
    fn test_from_config_rejects_duplicates_and_blanks() {
        let mut config = Config::default();
        config.providers.openai.models = vec!["gpt-4o".into(), "gpt-4o".into()];
        assert!(matches!(
            ProviderRegistry::from_config(&config),
            Err(RegistryError::DuplicateModel { .. })
        ));

        let mut config = Config::default();
        config.providers.openai.models = vec!["  ".into()];
        assert_eq!(
            ProviderRegistry::from_config(&config).unwrap_err(),
            RegistryError::EmptyModelList {
                provider: Provider::ChatGpt
            }
        );
    }

    #[test]
    fn test_from_config_unknown_default_provider() {
        let mut config = Config::default();
        config.bot.default_provider = "mistral".into();
        assert_eq!(
            ProviderRegistry::from_config(&config).unwrap_err(),
            RegistryError::UnknownProvider("mistral".into())
        );
    }
}
