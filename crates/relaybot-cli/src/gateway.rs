//! Gateway command: runs the router and the chat channels over one bus.
//!
//! Startup sequence:
//! 1. Load and validate config (a transport token is required when a
//!    transport is compiled in)
//! 2. Build retry-wrapped provider clients and the router
//! 3. Create the message bus and channel manager, register channels
//! 4. Run: `tokio::select!` of router + channel manager + Ctrl+C

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use relaybot_channels::ChannelManager;
use relaybot_core::bus::MessageBus;
use relaybot_core::config::load_config;

use crate::helpers;

/// Bus capacity in each direction.
const BUS_CAPACITY: usize = 100;

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    helpers::print_banner("Gateway");

    let config = load_config(config_path);
    let router = crate::build_router(&config, cfg!(feature = "telegram"))?;

    let bus = Arc::new(MessageBus::new(BUS_CAPACITY));

    #[allow(unused_mut)]
    let mut channel_manager = ChannelManager::new(bus.clone());

    #[cfg(feature = "telegram")]
    {
        use relaybot_channels::telegram::TelegramChannel;
        use relaybot_router::texts::COMMANDS;

        let telegram = TelegramChannel::new(&config.channels.telegram.token, bus.clone())
            .with_commands(COMMANDS.iter().copied());
        channel_manager.register(Arc::new(telegram));
    }

    let registry = router.registry();
    info!(
        provider = %registry.default_provider(),
        model = registry.default_model(),
        menu_style = ?config.bot.menu_style,
        channels = ?channel_manager.channel_names(),
        "gateway starting"
    );

    println!("  Default:   {} ({})", registry.default_model(), registry.default_provider());
    println!("  Channels:  {} registered", channel_manager.len());
    println!();

    if channel_manager.is_empty() {
        println!("  ⚠  No channels registered. Rebuild with `--features telegram`,");
        println!("     or use `relaybot chat` to talk to the bot locally.");
        println!();
    }

    println!("  Ctrl+C to stop");
    println!();

    tokio::select! {
        _ = router.clone().run(bus.clone()) => {
            info!("router exited");
        }
        result = channel_manager.start_all() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "channel manager error");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            println!();
            println!("  Shutting down...");
            info!("received Ctrl+C, shutting down");
            channel_manager.stop_all().await;
        }
    }

    println!("  Gateway stopped. Goodbye!");
    Ok(())
}
