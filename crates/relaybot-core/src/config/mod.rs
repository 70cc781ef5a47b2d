//! Configuration system: schema, loading, and env var overrides.
//!
//! # Usage
//! ```no_run
//! use relaybot_core::config;
//!
//! let cfg = config::load_config(None);
//! println!("Default provider: {}", cfg.bot.default_provider);
//! ```

pub mod loader;
pub mod schema;

// Re-export key types
pub use loader::{
    apply_env_overrides, apply_env_overrides_from, get_config_path, load_config, load_dotenv,
    save_config,
};
pub use schema::{
    BotConfig, ChannelsConfig, Config, ConfigError, MenuStyle, ProviderConfig, ProvidersConfig,
    TelegramConfig,
};
