//! Utility helpers: path resolution and string manipulation.

use std::path::PathBuf;

/// Get the Relaybot data directory (e.g. `~/.relaybot/`).
pub fn get_data_path() -> PathBuf {
    let home = home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".relaybot")
}

/// Get the REPL history file (e.g. `~/.relaybot/history/cli_history`).
pub fn get_history_path() -> PathBuf {
    get_data_path().join("history").join("cli_history")
}

/// Split `text` into consecutive pieces of at most `max_chars` characters.
///
/// Counts Unicode scalar values, never splits inside a character, and
/// concatenating the pieces yields `text` exactly. Empty input yields no
/// pieces. A `max_chars` of zero is treated as one.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        let cut = rest
            .char_indices()
            .nth(max_chars)
            .map(|(idx, _)| idx)
            .unwrap_or(rest.len());
        let (head, tail) = rest.split_at(cut);
        chunks.push(head.to_string());
        rest = tail;
    }

    chunks
}

/// Truncate a string to `max_len` characters, adding "..." if truncated.
/// Unicode-safe.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| std::env::var("USERPROFILE").ok().map(PathBuf::from))
}
