//! Relaybot CLI: entry point.
//!
//! # Commands
//!
//! - `relaybot gateway`: run the bot on its configured channels
//! - `relaybot chat [-m MESSAGE]`: talk to the router locally (single-shot or REPL)
//! - `relaybot status`: show configuration and provider status
//! - `relaybot onboard`: write a starter config file

mod gateway;
mod helpers;
mod onboard;
mod repl;
mod status;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use relaybot_core::config::{load_config, Config};
use relaybot_providers::create_clients;
use relaybot_router::BotRouter;

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// Relaybot: relay chat messages to DeepSeek, ChatGPT or Claude
#[derive(Parser)]
#[command(name = "relaybot", version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.relaybot/config.json)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bot on all configured channels
    Gateway {
        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Chat with the router locally (single-shot or interactive REPL)
    Chat {
        /// Single message (non-interactive). Omit for REPL mode.
        #[arg(short, long)]
        message: Option<String>,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Show configuration and provider status
    Status,

    /// Write a starter configuration file
    Onboard,
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path: Option<PathBuf> = cli.config.as_deref().map(helpers::expand_tilde);

    match cli.command {
        Commands::Gateway { logs } => {
            init_logging(logs, "info");
            gateway::run(config_path.as_deref()).await
        }
        Commands::Chat { message, logs } => {
            init_logging(logs, "warn");
            let config = load_config(config_path.as_deref());
            let router = build_router(&config, false)?;
            match message {
                Some(msg) => repl::run_once(&router, &msg).await,
                None => repl::run(&router).await,
            }
        }
        Commands::Status => status::run(config_path.as_deref()),
        Commands::Onboard => onboard::run(config_path.as_deref()),
    }
}

/// Validate `config` and build the router with retry-wrapped clients.
pub fn build_router(config: &Config, require_transport: bool) -> Result<Arc<BotRouter>> {
    config
        .validate(require_transport)
        .context("invalid configuration")?;

    let clients = create_clients(config);
    let router = BotRouter::from_config(config, clients).context("invalid model configuration")?;
    Ok(Arc::new(router))
}

/// Initialize tracing/logging.
///
/// `--logs` turns on debug output for the relaybot crates; otherwise
/// `RUST_LOG` is honoured, falling back to `default_level`.
fn init_logging(verbose: bool, default_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new(
            "relaybot_core=debug,relaybot_providers=debug,relaybot_router=debug,relaybot_channels=debug,info",
        )
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
