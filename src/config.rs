//! Configuration management for Intercom.
//!
//! Configuration is read from environment variables:
//! - `REASONING_API_KEY` - Required. API key for the reasoning service.
//! - `REASONING_MODEL` - Optional. Chat model identifier. Defaults to `gpt-4.1`.
//! - `REASONING_BASE_URL` - Optional. OpenAI-compatible endpoint. Defaults to
//!   `https://api.openai.com/v1`.
//! - `REASONING_TEMPERATURE` - Optional. Sampling temperature. Defaults to `0.1`.
//! - `REASONING_MAX_TOKENS` - Optional. Completion token cap. Defaults to `1000`.
//! - `PLANS_DIR` - Optional. Directory for plan artifact files. Defaults to `.`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Runtime configuration shared by the gateway and the nodes.
#[derive(Debug, Clone)]
pub struct Config {
    /// Reasoning-service API key
    pub api_key: String,

    /// Chat model identifier
    pub model: String,

    /// OpenAI-compatible endpoint base URL (no trailing slash)
    pub base_url: String,

    /// Sampling temperature for conversational turns
    pub temperature: f64,

    /// Completion token cap
    pub max_tokens: u64,

    /// Directory where plan artifact files are written
    pub plans_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `REASONING_API_KEY` is not set,
    /// or `ConfigError::InvalidValue` for unparseable numeric overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("REASONING_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("REASONING_API_KEY".to_string()))?;

        let model = std::env::var("REASONING_MODEL").unwrap_or_else(|_| "gpt-4.1".to_string());

        let base_url = std::env::var("REASONING_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string())
            .trim_end_matches('/')
            .to_string();

        let temperature = std::env::var("REASONING_TEMPERATURE")
            .unwrap_or_else(|_| "0.1".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue("REASONING_TEMPERATURE".to_string(), format!("{}", e)))?;

        let max_tokens = std::env::var("REASONING_MAX_TOKENS")
            .unwrap_or_else(|_| "1000".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue("REASONING_MAX_TOKENS".to_string(), format!("{}", e)))?;

        let plans_dir = std::env::var("PLANS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));

        Ok(Self {
            api_key,
            model,
            base_url,
            temperature,
            max_tokens,
            plans_dir,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: "https://api.openai.com/v1".to_string(),
            temperature: 0.1,
            max_tokens: 1000,
            plans_dir: PathBuf::from("."),
        }
    }
}
