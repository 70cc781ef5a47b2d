//! Fixed user-facing texts.

use relaybot_providers::{Provider, ProviderRegistry};

use crate::store::{UserSelection, WizardState};

pub const WELCOME: &str = "Hi! I relay your messages to DeepSeek, ChatGPT or Claude.\n\
Just send a question, or use /choose_model to pick who answers. /help lists all commands.";

pub const FINISH_SELECTION: &str =
    "Please finish choosing a model using the menu first (or send /choose_model to start over).";

pub const GENERIC_ERROR: &str = "Something went wrong. Please try again later.";

pub const KEYBOARD_HIDDEN: &str = "Keyboard hidden.";

/// Bot commands with their descriptions, in display order.
pub const COMMANDS: &[(&str, &str)] = &[
    ("start", "start the bot"),
    ("help", "list commands and models"),
    ("choose_model", "choose a provider, then a model"),
    ("quick_select", "switch provider and model in one tap"),
    ("current_model", "show the active provider and model"),
    ("hide_keyboard", "hide the selection keyboard"),
];

/// `/help` text, including the configured models.
pub fn help(registry: &ProviderRegistry) -> String {
    let mut text = String::from("Available commands:\n");
    for (name, description) in COMMANDS {
        text.push_str(&format!("/{name} - {description}\n"));
    }
    text.push_str("\nModels:\n");
    for provider in Provider::ALL {
        text.push_str(&format!(
            "{}: {}\n",
            provider,
            registry.models(provider).join(", ")
        ));
    }
    text.push_str("\nSend any other message and the selected model will answer it.");
    text
}

/// `/current_model` text. While a model is still to be chosen the stored
/// provider is the new one, so no model is shown next to it.
pub fn current_model(selection: &UserSelection) -> String {
    match selection.wizard_state {
        WizardState::Idle => format!("Current model: {} ({}).", selection.model, selection.provider),
        WizardState::AwaitingProvider => format!(
            "Current model: {} ({}).\nA new selection is in progress: choose a provider.",
            selection.model, selection.provider
        ),
        WizardState::AwaitingModel(provider) => format!(
            "Selection in progress: {provider} chosen, choose a model to finish \
             (or send /choose_model to start over)."
        ),
    }
}

pub fn unknown_command(name: &str) -> String {
    format!("Unknown command /{name}. Use /help to see what I can do.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_help_lists_commands_and_models() {
        let text = help(&ProviderRegistry::builtin());
        for (name, _) in COMMANDS {
            assert!(text.contains(&format!("/{name}")));
        }
        assert!(text.contains("ChatGPT: gpt-4o, gpt-4o-mini, gpt-3.5-turbo"));
    }

    #[test]
    fn test_current_model() {
        let mut selection = UserSelection {
            provider: Provider::Claude,
            model: "claude-3-opus-latest".into(),
            wizard_state: WizardState::Idle,
        };
        assert_eq!(
            current_model(&selection),
            "Current model: claude-3-opus-latest (Claude)."
        );

        selection.wizard_state = WizardState::AwaitingProvider;
        let text = current_model(&selection);
        assert!(text.starts_with("Current model: claude-3-opus-latest (Claude)."));
        assert!(text.contains("in progress"));

        selection.wizard_state = WizardState::AwaitingModel(Provider::Claude);
        let text = current_model(&selection);
        assert!(text.contains("Claude chosen"));
        assert!(!text.contains("claude-3-opus-latest"));
    }
}
