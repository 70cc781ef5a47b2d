//! `relaybot onboard`: write a starter configuration file.
//!
//! Creates `~/.relaybot/config.json` (or the `--config` path) with every
//! setting at its default, ready for the API keys and bot token to be
//! filled in, plus the history directory used by `relaybot chat`.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use relaybot_core::config::{get_config_path, save_config, Config};
use relaybot_core::utils::get_history_path;

pub fn run(config_path: Option<&Path>) -> Result<()> {
    println!();
    println!("{}", "Relaybot — Setup".cyan().bold());
    println!();

    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(get_config_path);

    if write_default_config(&path)? {
        println!("  {} created config at {}", "✓".green(), path.display());
    } else {
        println!("  {} config already exists at {}", "✓".green(), path.display());
    }

    if let Some(history_dir) = get_history_path().parent() {
        std::fs::create_dir_all(history_dir)
            .with_context(|| format!("failed to create {}", history_dir.display()))?;
    }

    println!();
    println!("  Next: set TELEGRAM_TOKEN, DEEPSEEK_API_KEY, OPENAI_API_KEY and");
    println!("  ANTHROPIC_API_KEY (or fill them into the config), then run");
    println!("  `relaybot gateway`.");
    println!();

    Ok(())
}

/// Write a default config to `path` unless one exists. Returns whether a
/// file was written.
fn write_default_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    save_config(&Config::default(), Some(path))
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(true)
}
