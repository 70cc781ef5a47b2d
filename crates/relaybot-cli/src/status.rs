//! `relaybot status`: show configuration and provider status.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use relaybot_core::config::{get_config_path, load_config};
use relaybot_providers::{ProviderRegistry, PROVIDERS};

pub fn run(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path);
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(get_config_path);

    println!();
    println!("{}", "Relaybot Status".cyan().bold());
    println!();

    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        path.display(),
        found_marker(path.exists())
    );

    let telegram = if config.channels.telegram.token.trim().is_empty() {
        format!("{}", "· token not set".dimmed())
    } else {
        format!("{} (token set)", "✓".green())
    };
    println!("  {:<18} {}", "Telegram:".bold(), telegram);

    let bot = &config.bot;
    println!(
        "  {:<18} {} | max_tokens: {} | attempts: {} | chunk: {} | menus: {:?}",
        "Parameters:".bold(),
        format!("timeout: {}s", bot.request_timeout_secs).dimmed(),
        bot.max_tokens,
        bot.max_attempts,
        bot.chunk_size,
        bot.menu_style,
    );

    // Providers
    println!();
    println!("  {}", "Providers:".bold());
    let registry = ProviderRegistry::from_config(&config);

    for spec in &PROVIDERS {
        let configured = config
            .providers
            .get_by_name(spec.config_name)
            .is_some_and(|p| p.is_configured());
        let status = if configured {
            format!("{} (key set)", "✓".green())
        } else {
            format!("{} (set {})", "· not configured".dimmed(), spec.env_key)
        };
        println!("    {:<12} {}", spec.display_name, status);

        if let Ok(registry) = &registry {
            println!(
                "    {:<12} {}",
                "",
                registry.models(spec.provider).join(", ").dimmed()
            );
        }
    }

    println!();
    match (&registry, config.validate(false)) {
        (Ok(registry), Ok(())) => println!(
            "  {:<18} {} ({})",
            "Default:".bold(),
            registry.default_model(),
            registry.default_provider()
        ),
        (Err(e), _) => println!("  {:<18} {}", "Models:".bold(), e.to_string().red()),
        (_, Err(e)) => println!("  {:<18} {}", "Config:".bold(), e.to_string().red()),
    }
    println!();

    Ok(())
}

fn found_marker(exists: bool) -> String {
    if exists {
        "✓".green().to_string()
    } else {
        "(not found)".red().to_string()
    }
}
