//! Provider trait definitions for chat completion clients

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::Backend;

/// Default sampling temperature; grading needs deterministic answers
pub const DEFAULT_TEMPERATURE: f32 = 0.0;
/// Default output budget; answers are a single letter
pub const DEFAULT_MAX_TOKENS: u32 = 10;

/// Which model to benchmark and how to reach it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub backend: Backend,
    pub model_name: String,
    /// Overrides the credential resolved for the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Overrides the backend's endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_temperature() -> f32 { DEFAULT_TEMPERATURE }
fn default_max_tokens() -> u32 { DEFAULT_MAX_TOKENS }

impl ModelConfig {
    pub fn new(backend: Backend, model_name: impl Into<String>) -> Self {
        Self {
            backend,
            model_name: model_name.into(),
            api_key: None,
            base_url: None,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Token accounting reported by the backend, when available
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt: u32,
    pub completion: u32,
    pub total: u32,
}

/// Response from a single-turn completion
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
    pub usage: Option<TokenUsage>,
    pub finish_reason: String,
}

impl CompletionResponse {
    /// A bare text response with no usage data
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            model: String::new(),
            usage: None,
            finish_reason: "stop".to_string(),
        }
    }
}

/// Error types for provider operations
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Missing credential, unknown backend, unusable endpoint
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl ProviderError {
    /// True for errors raised before any request is sent
    pub fn is_configuration(&self) -> bool {
        matches!(self, ProviderError::Config(_))
    }

    /// True for failures of a completion call itself
    pub fn is_completion(&self) -> bool {
        !self.is_configuration()
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// A chat completion backend bound to one model.
///
/// Calls are single-turn; no conversation state is kept between them.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Backend name (e.g., "openrouter", "ollama")
    fn name(&self) -> &str;

    /// Model identifier sent with every request
    fn model(&self) -> &str;

    /// Wait until a request may be sent, e.g. for a rate limit.
    ///
    /// Awaited before the call is timed; `complete` itself never queues.
    async fn ready(&self) {}

    /// Send one prompt and return the model's reply
    async fn complete(&self, prompt: &str) -> ProviderResult<CompletionResponse>;
}
