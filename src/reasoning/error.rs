//! Reasoning provider error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReasoningError {
    #[error("network error: {0}")]
    Network(String),

    #[error("api error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("failed to parse response: {0}")]
    Parse(String),

    #[error("provider returned no choices")]
    EmptyResponse,
}

impl From<reqwest::Error> for ReasoningError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ReasoningError::Network(format!("request timeout: {err}"))
        } else if err.is_connect() {
            ReasoningError::Network(format!("connection failed: {err}"))
        } else {
            ReasoningError::Network(format!("request failed: {err}"))
        }
    }
}
