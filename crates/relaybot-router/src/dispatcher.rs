//! Dispatcher: sends a user's prompt to their selected provider and
//! returns the reply as ordered, size-bounded chunks.

use std::sync::Arc;

use tracing::{error, info};

use relaybot_core::utils::chunk_text;
use relaybot_providers::ClientMap;

use crate::store::SelectionStore;

/// Sent when a provider returns an empty reply.
pub const EMPTY_REPLY: &str = "(empty response)";

pub struct Dispatcher {
    store: Arc<dyn SelectionStore>,
    clients: ClientMap,
    chunk_size: usize,
}

impl Dispatcher {
    pub fn new(store: Arc<dyn SelectionStore>, clients: ClientMap, chunk_size: usize) -> Self {
        Self {
            store,
            clients,
            chunk_size,
        }
    }

    /// Relay `prompt` for `user_id`. Never fails: provider errors come back
    /// as their user-facing text, and the result always has at least one chunk.
    pub async fn handle(&self, user_id: &str, prompt: &str) -> Vec<String> {
        let selection = self.store.snapshot(user_id);
        let provider = selection.provider;
        let model = selection.model;

        let reply = match self.clients.get(&provider) {
            Some(client) => match client.complete(prompt, &model).await {
                Ok(text) => text,
                Err(e) => {
                    error!(user = user_id, provider = %provider, model = %model, error = %e, "completion failed");
                    e.to_string()
                }
            },
            None => {
                error!(user = user_id, provider = %provider, "no client configured");
                format!("{} is not configured on this bot.", provider)
            }
        };

        let mut chunks = chunk_text(&reply, self.chunk_size);
        if chunks.is_empty() {
            chunks.push(EMPTY_REPLY.to_string());
        }

        info!(
            user = user_id,
            provider = %provider,
            model = %model,
            prompt_chars = prompt.chars().count(),
            chunks = chunks.len(),
            "prompt relayed"
        );
        chunks
    }
}
