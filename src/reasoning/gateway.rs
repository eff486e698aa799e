//! Gateway between nodes and the reasoning provider.

use std::sync::Arc;
use tracing::{debug, error};

use super::{ChatMessage, CompletionOptions, ReasoningClient};
use crate::config::Config;

/// Sentinel returned instead of an error when the provider call fails.
/// Callers compare against this to branch on failure.
pub const EXTRACTION_FAILED: &str = "Reasoning request failed.";

const DIRECTIVE: &str = "You are a direct and concise AI agent for an organization. \
Provide short, to-the-point answers and do not continue repeating Goodbyes. \
End after conveying necessary information.";

/// Wraps a [`ReasoningClient`] with the shared system directive and a
/// never-fails contract: every call returns text, with [`EXTRACTION_FAILED`]
/// standing in for any provider error.
pub struct ReasoningGateway {
    client: Arc<dyn ReasoningClient>,
    model: String,
    temperature: f64,
    max_tokens: u64,
}

impl ReasoningGateway {
    pub fn new(client: Arc<dyn ReasoningClient>, config: &Config) -> Self {
        Self {
            client,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    pub fn is_failure(text: &str) -> bool {
        text == EXTRACTION_FAILED
    }

    /// Runs a conversational completion over the given history.
    pub async fn complete(&self, messages: Vec<ChatMessage>) -> String {
        self.run(messages, false).await
    }

    /// Runs a single-prompt completion in JSON object mode, used by the
    /// intent extractors.
    pub async fn extract(&self, prompt: &str) -> String {
        self.run(vec![ChatMessage::user(prompt)], true).await
    }

    async fn run(&self, messages: Vec<ChatMessage>, json_object: bool) -> String {
        let mut combined = Vec::with_capacity(messages.len() + 1);
        combined.push(ChatMessage::system(DIRECTIVE));
        combined.extend(messages);

        debug!(
            model = %self.model,
            message_count = combined.len(),
            json_object,
            "reasoning request"
        );

        let options = CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            json_object,
        };
        match self.client.complete(&self.model, &combined, options).await {
            Ok(text) => {
                let text = text.trim().to_string();
                debug!(response_len = text.len(), "reasoning response");
                text
            }
            Err(err) => {
                error!(%err, "reasoning request failed");
                EXTRACTION_FAILED.to_string()
            }
        }
    }
}
