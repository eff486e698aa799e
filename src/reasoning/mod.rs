//! Reasoning service access.
//!
//! A trait-based abstraction over chat-completion providers, with an
//! OpenAI-compatible HTTP client as the primary implementation. Nodes never
//! talk to a client directly; they go through [`ReasoningGateway`], which
//! injects the shared system directive and converts failures into a
//! sentinel string.

mod error;
mod gateway;
mod openai;
#[cfg(test)]
pub mod scripted;

pub use error::ReasoningError;
pub use gateway::{ReasoningGateway, EXTRACTION_FAILED};
pub use openai::OpenAiClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Role in a chat conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A message in a chat conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Per-request knobs passed through to the provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompletionOptions {
    pub temperature: Option<f64>,
    pub max_tokens: Option<u64>,
    /// Ask the provider for a JSON object response, used by the extractors.
    pub json_object: bool,
}

/// A chat-completion provider.
#[async_trait]
pub trait ReasoningClient: Send + Sync {
    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: CompletionOptions,
    ) -> Result<String, ReasoningError>;
}
