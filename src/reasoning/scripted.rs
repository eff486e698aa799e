//! Scripted reasoning client for tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::{ChatMessage, CompletionOptions, ReasoningClient, ReasoningError};

/// Replays canned responses in order and records every call. An exhausted
/// script behaves like a provider outage.
pub struct ScriptedClient {
    responses: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
    options: Mutex<Vec<CompletionOptions>>,
}

impl ScriptedClient {
    pub fn with_responses<I, S>(responses: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            calls: Mutex::new(Vec::new()),
            options: Mutex::new(Vec::new()),
        })
    }

    pub fn push_response(&self, response: impl Into<String>) {
        self.responses.lock().unwrap().push_back(response.into());
    }

    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_options(&self) -> Option<CompletionOptions> {
        self.options.lock().unwrap().last().copied()
    }
}

#[async_trait]
impl ReasoningClient for ScriptedClient {
    async fn complete(
        &self,
        _model: &str,
        messages: &[ChatMessage],
        options: CompletionOptions,
    ) -> Result<String, ReasoningError> {
        self.calls.lock().unwrap().push(messages.to_vec());
        self.options.lock().unwrap().push(options);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ReasoningError::Network("script exhausted".to_string()))
    }
}
