//! Interactive REPL: a local `cli` channel over the same router the
//! gateway runs.
//!
//! Uses `rustyline` for readline-style editing with persistent history.
//! Menus are printed as numbered lists; answering with a number (or an
//! inline button's label) picks that entry.

use anyhow::Result;
use rustyline::config::Configurer;
use rustyline::history::DefaultHistory;
use rustyline::{DefaultEditor, Editor};
use tracing::debug;

use relaybot_core::bus::{InboundKind, InboundMessage, Menu, OutboundKind, OutboundMessage};
use relaybot_core::utils::get_history_path;
use relaybot_router::BotRouter;

use crate::helpers;

const CHANNEL: &str = "cli";
const LOCAL_USER: &str = "local";

/// Exit commands (case-insensitive match).
const EXIT_COMMANDS: &[&str] = &["exit", "quit", "/exit", "/quit", ":q"];

/// Handle a single line and print the replies.
pub async fn run_once(router: &BotRouter, line: &str) -> Result<()> {
    let inbound = to_inbound(line.trim(), None);
    let replies = router.handle_event(&inbound).await;
    print_outbound(&replies, None);
    Ok(())
}

/// Run the interactive REPL loop.
pub async fn run(router: &BotRouter) -> Result<()> {
    helpers::print_banner("Chat");
    println!("Type a message or a /command, or \"exit\" to quit.");
    println!();

    let mut editor = create_editor()?;
    let mut menu: Option<Menu> = None;

    loop {
        let input = match editor.readline("You: ") {
            Ok(line) => line,
            Err(rustyline::error::ReadlineError::Interrupted)
            | Err(rustyline::error::ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            continue;
        }

        if is_exit_command(trimmed) {
            println!("\nGoodbye!");
            break;
        }

        let _ = editor.add_history_entry(&input);

        let inbound = to_inbound(trimmed, menu.as_ref());
        debug!(kind = ?inbound.kind, "processing input");

        let relayed = inbound.kind == InboundKind::Text;
        if relayed {
            helpers::print_thinking();
        }
        let replies = router.handle_event(&inbound).await;
        if relayed {
            helpers::clear_thinking();
        }

        menu = print_outbound(&replies, menu);
    }

    save_history(&mut editor);

    Ok(())
}

/// Turn a line of input into an inbound event. While a menu is showing, a
/// 1-based number or an inline button's label picks that entry.
fn to_inbound(line: &str, menu: Option<&Menu>) -> InboundMessage {
    if let Some(menu) = menu {
        let index = match line.parse::<usize>() {
            Ok(n) if n >= 1 => Some(n - 1),
            Ok(_) => None,
            Err(_) => menu.labels().iter().position(|label| *label == line),
        };
        if let Some(value) = index.and_then(|i| menu.pick(i)) {
            return InboundMessage::choice(CHANNEL, LOCAL_USER, LOCAL_USER, value);
        }
    }
    InboundMessage::from_user_text(CHANNEL, LOCAL_USER, LOCAL_USER, line)
}

/// Print replies in order and return the menu that is showing afterwards.
fn print_outbound(replies: &[OutboundMessage], mut menu: Option<Menu>) -> Option<Menu> {
    for reply in replies {
        match &reply.kind {
            OutboundKind::Typing => continue,
            OutboundKind::Text { menu: attached } | OutboundKind::Edit { menu: attached, .. } => {
                menu = attached.clone();
            }
            OutboundKind::RemoveMenu => menu = None,
        }
        helpers::print_reply(&reply.content, reply.menu());
    }
    menu
}

fn create_editor() -> Result<Editor<(), DefaultHistory>> {
    let mut editor = DefaultEditor::new()?;
    editor.set_max_history_size(1000)?;

    let history_path = get_history_path();
    if history_path.exists() {
        let _ = editor.load_history(&history_path);
        debug!("loaded REPL history from {}", history_path.display());
    }

    Ok(editor)
}

fn save_history(editor: &mut Editor<(), DefaultHistory>) {
    let path = get_history_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = editor.save_history(&path) {
        debug!("failed to save history: {e}");
    }
}

fn is_exit_command(input: &str) -> bool {
    let lower = input.to_lowercase();
    EXIT_COMMANDS.contains(&lower.as_str())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
