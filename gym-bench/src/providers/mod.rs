//! Chat completion backends

pub mod openai;
pub mod traits;

pub use openai::OpenAIClient;
pub use traits::{
    CompletionResponse, LLMProvider, ModelConfig, ProviderError, ProviderResult, TokenUsage,
    DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE,
};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{CatalogSettings, Config, Credentials};
use crate::runner::rate_limiter::RateLimiter;

/// Supported completion backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Catalog-routed gateway proxying many vendors
    OpenRouter,
    OpenAI,
    Anthropic,
    Google,
    /// Local inference server
    Ollama,
}

impl Backend {
    pub fn all() -> Vec<Backend> {
        vec![
            Backend::OpenRouter,
            Backend::OpenAI,
            Backend::Anthropic,
            Backend::Google,
            Backend::Ollama,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::OpenRouter => "openrouter",
            Backend::OpenAI => "openai",
            Backend::Anthropic => "anthropic",
            Backend::Google => "google",
            Backend::Ollama => "ollama",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Backend::OpenRouter => "https://openrouter.ai/api/v1",
            Backend::OpenAI => "https://api.openai.com/v1",
            Backend::Anthropic => "https://api.anthropic.com/v1",
            Backend::Google => "https://generativelanguage.googleapis.com/v1",
            Backend::Ollama => "http://localhost:11434/v1",
        }
    }

    /// Environment variable supplying the default key, if the backend needs one
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            Backend::OpenRouter => Some("OPENROUTER_API_KEY"),
            Backend::OpenAI => Some("OPENAI_API_KEY"),
            Backend::Anthropic => Some("ANTHROPIC_API_KEY"),
            Backend::Google => Some("GOOGLE_API_KEY"),
            Backend::Ollama => None,
        }
    }

    pub fn requires_api_key(&self) -> bool {
        self.api_key_env().is_some()
    }
}

impl std::str::FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openrouter" => Ok(Backend::OpenRouter),
            "openai" | "gpt" => Ok(Backend::OpenAI),
            "anthropic" | "claude" => Ok(Backend::Anthropic),
            "google" | "gemini" => Ok(Backend::Google),
            "ollama" | "local" => Ok(Backend::Ollama),
            _ => Err(format!("Unsupported provider: {}", s)),
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Builds a completion client for a model configuration.
///
/// Construction is where configuration problems surface, before any
/// network call is made.
pub trait ClientFactory: Send + Sync {
    fn create(&self, model: &ModelConfig) -> ProviderResult<Arc<dyn LLMProvider>>;
}

/// Factory for the HTTP clients, holding the resolved credentials
pub struct HttpClientFactory {
    credentials: Credentials,
    identity: CatalogSettings,
    timeout: Duration,
    /// One limiter per backend, shared by every model on it
    rate_limiters: HashMap<Backend, Arc<RateLimiter>>,
}

impl HttpClientFactory {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            identity: CatalogSettings::default(),
            timeout: Duration::from_millis(60_000),
            rate_limiters: HashMap::new(),
        }
    }

    /// Factory with rate limits, identity and timeout taken from config
    pub fn from_config(config: &Config, credentials: Credentials) -> Self {
        let rate_limiters = Backend::all()
            .into_iter()
            .map(|backend| {
                let rpm = config.provider(backend).rpm;
                (backend, Arc::new(RateLimiter::new(rpm)))
            })
            .collect();

        Self {
            credentials,
            identity: config.catalog.clone(),
            timeout: Duration::from_millis(config.benchmark.timeout_ms),
            rate_limiters,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl ClientFactory for HttpClientFactory {
    fn create(&self, model: &ModelConfig) -> ProviderResult<Arc<dyn LLMProvider>> {
        let api_key = model
            .api_key
            .clone()
            .or_else(|| self.credentials.api_key(model.backend).map(String::from));

        if model.backend.requires_api_key() && api_key.is_none() {
            return Err(ProviderError::Config(format!(
                "{} not found. Set it in the environment or pass an API key.",
                model.backend.api_key_env().unwrap_or("API key")
            )));
        }

        let base_url = model
            .base_url
            .clone()
            .unwrap_or_else(|| self.credentials.base_url(model.backend).to_string());

        let mut client = OpenAIClient::new(model.backend, &model.model_name, api_key, base_url)?
            .with_sampling(model.temperature, model.max_tokens)
            .with_timeout(self.timeout)?;

        if model.backend == Backend::OpenRouter {
            client = client
                .with_header("HTTP-Referer", &self.identity.referer)
                .with_header("X-Title", &self.identity.title);
        }

        if let Some(limiter) = self.rate_limiters.get(&model.backend) {
            client = client.with_rate_limiter(limiter.clone());
        }

        Ok(Arc::new(client))
    }
}

/// Parse a backend name and build its client in one step
pub fn create_client(
    backend: &str,
    model_name: &str,
    factory: &dyn ClientFactory,
) -> ProviderResult<Arc<dyn LLMProvider>> {
    let backend: Backend = backend.parse().map_err(ProviderError::Config)?;
    factory.create(&ModelConfig::new(backend, model_name))
}
