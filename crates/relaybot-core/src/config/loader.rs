//! Config loader: reads `~/.relaybot/config.json`, a `.env` file and
//! environment variables.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.relaybot/config.json`
//! 3. `.env` in the working directory (never overrides the real environment)
//! 4. Environment variables (override JSON):
//!    - `RELAYBOT_<SECTION>__<FIELD>`
//!    - the conventional `TELEGRAM_TOKEN`, `OPENAI_API_KEY`,
//!      `DEEPSEEK_API_KEY`, `ANTHROPIC_API_KEY` names

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::{Config, MenuStyle, ProviderConfig};

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the default path + `.env` + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    load_dotenv();

    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    apply_env_overrides(load_config_from_path(&config_path))
}

/// Load `.env` from the working directory, if present.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => warn!("Failed to load .env: {}", e),
    }
}

/// Load config from a specific file path, without env overrides.
fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return Config::default();
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return Config::default();
        }
    };

    let mut raw: serde_json::Value = match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            warn!("Failed to parse config JSON: {}", e);
            return Config::default();
        }
    };

    migrate_config(&mut raw);

    match serde_json::from_value(raw) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to deserialize config: {}", e);
            Config::default()
        }
    }
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config).map_err(std::io::Error::other)?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Accept product names as provider section keys.
///
/// Moves `providers.chatgpt` → `providers.openai` and
/// `providers.claude` → `providers.anthropic` unless the target exists.
fn migrate_config(raw: &mut serde_json::Value) {
    let Some(providers) = raw.get_mut("providers").and_then(|p| p.as_object_mut()) else {
        return;
    };
    for (alias, canonical) in [("chatgpt", "openai"), ("claude", "anthropic")] {
        if providers.contains_key(canonical) {
            continue;
        }
        if let Some(section) = providers.remove(alias) {
            providers.insert(canonical.to_string(), section);
            debug!("Migrated providers.{} → providers.{}", alias, canonical);
        }
    }
}

/// Apply environment variable overrides from the process environment.
pub fn apply_env_overrides(config: Config) -> Config {
    apply_env_overrides_from(config, &|key| std::env::var(key).ok())
}

/// Apply environment variable overrides using `lookup` to resolve names.
///
/// Supported overrides:
/// - `RELAYBOT_BOT__DEFAULT_PROVIDER` → `bot.default_provider`
/// - `RELAYBOT_BOT__DEFAULT_MODEL` → `bot.default_model`
/// - `RELAYBOT_BOT__MAX_TOKENS` → `bot.max_tokens`
/// - `RELAYBOT_BOT__MAX_ATTEMPTS` → `bot.max_attempts`
/// - `RELAYBOT_BOT__BACKOFF_BASE` → `bot.backoff_base`
/// - `RELAYBOT_BOT__CHUNK_SIZE` → `bot.chunk_size`
/// - `RELAYBOT_BOT__REQUEST_TIMEOUT_SECS` → `bot.request_timeout_secs`
/// - `RELAYBOT_BOT__MENU_STYLE` → `bot.menu_style` (`inline` | `keyboard`)
/// - `RELAYBOT_PROVIDERS__<NAME>__API_KEY` → `providers.<name>.api_key`
/// - `RELAYBOT_PROVIDERS__<NAME>__API_BASE` → `providers.<name>.api_base`
/// - `RELAYBOT_CHANNELS__TELEGRAM__TOKEN` → `channels.telegram.token`
///
/// The prefixed name wins over the conventional alias when both are set.
pub fn apply_env_overrides_from(mut config: Config, lookup: &dyn Fn(&str) -> Option<String>) -> Config {
    let bot = &mut config.bot;
    if let Some(val) = lookup("RELAYBOT_BOT__DEFAULT_PROVIDER") {
        bot.default_provider = val;
    }
    if let Some(val) = lookup("RELAYBOT_BOT__DEFAULT_MODEL") {
        bot.default_model = Some(val).filter(|v| !v.trim().is_empty());
    }
    parse_into(lookup, "RELAYBOT_BOT__MAX_TOKENS", &mut bot.max_tokens);
    parse_into(lookup, "RELAYBOT_BOT__MAX_ATTEMPTS", &mut bot.max_attempts);
    parse_into(lookup, "RELAYBOT_BOT__BACKOFF_BASE", &mut bot.backoff_base);
    parse_into(lookup, "RELAYBOT_BOT__CHUNK_SIZE", &mut bot.chunk_size);
    parse_into(
        lookup,
        "RELAYBOT_BOT__REQUEST_TIMEOUT_SECS",
        &mut bot.request_timeout_secs,
    );
    if let Some(val) = lookup("RELAYBOT_BOT__MENU_STYLE") {
        match val.trim().to_lowercase().as_str() {
            "inline" => bot.menu_style = MenuStyle::Inline,
            "keyboard" => bot.menu_style = MenuStyle::Keyboard,
            other => warn!("Ignoring unknown RELAYBOT_BOT__MENU_STYLE '{}'", other),
        }
    }

    apply_provider_env(lookup, &mut config.providers.deepseek, "DEEPSEEK", "DEEPSEEK_API_KEY");
    apply_provider_env(lookup, &mut config.providers.openai, "OPENAI", "OPENAI_API_KEY");
    apply_provider_env(
        lookup,
        &mut config.providers.anthropic,
        "ANTHROPIC",
        "ANTHROPIC_API_KEY",
    );

    if let Some(val) = lookup("RELAYBOT_CHANNELS__TELEGRAM__TOKEN").or_else(|| lookup("TELEGRAM_TOKEN")) {
        config.channels.telegram.token = val;
    }

    config
}

/// Apply env var overrides for a single provider.
fn apply_provider_env(
    lookup: &dyn Fn(&str) -> Option<String>,
    provider: &mut ProviderConfig,
    name: &str,
    alias: &str,
) {
    if let Some(val) =
        lookup(&format!("RELAYBOT_PROVIDERS__{name}__API_KEY")).or_else(|| lookup(alias))
    {
        provider.api_key = val;
    }
    if let Some(val) = lookup(&format!("RELAYBOT_PROVIDERS__{name}__API_BASE")) {
        provider.api_base = Some(val);
    }
}

fn parse_into<T: std::str::FromStr>(
    lookup: &dyn Fn(&str) -> Option<String>,
    key: &str,
    target: &mut T,
) {
    if let Some(val) = lookup(key) {
        match val.trim().parse::<T>() {
            Ok(v) => *target = v,
            Err(_) => warn!("Ignoring unparsable {}='{}'", key, val),
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
