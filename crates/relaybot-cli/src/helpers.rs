//! Shared CLI helpers: path expansion, reply printing, banner.

use std::path::PathBuf;

use colored::Colorize;

use relaybot_core::bus::Menu;

/// Expand `~` at the start of a path to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_next::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs_next::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// Render a menu as a numbered list, one entry per line.
pub fn format_menu(menu: &Menu) -> String {
    menu.labels()
        .iter()
        .enumerate()
        .map(|(i, label)| format!("  {}. {}", i + 1, label))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Print one bot message, with its menu if it has one.
pub fn print_reply(text: &str, menu: Option<&Menu>) {
    println!();
    println!("{}", "Relaybot".cyan().bold());
    if text.is_empty() {
        println!("{}", "(no response)".dimmed());
    } else {
        println!("{text}");
    }
    if let Some(menu) = menu {
        println!("{}", format_menu(menu).yellow());
        println!("{}", "Pick by number or label.".dimmed());
    }
    println!();
}

pub fn print_banner(mode: &str) {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!("{}  v{}  {}", "Relaybot".cyan().bold(), version.dimmed(), mode.dimmed());
    println!();
}

pub fn print_thinking() {
    eprint!("{}", "⠿ thinking...".dimmed());
}

pub fn clear_thinking() {
    eprint!("\r{}\r", " ".repeat(40));
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
