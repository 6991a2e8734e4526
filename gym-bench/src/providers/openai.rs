//! OpenAI-compatible chat completions client
//!
//! Every supported backend speaks `POST {base_url}/chat/completions`; they
//! differ only in endpoint, credential and extra headers.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::traits::{
    CompletionResponse, LLMProvider, ProviderError, ProviderResult, TokenUsage,
    DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE,
};
use super::Backend;
use crate::runner::rate_limiter::RateLimiter;

/// Chat completions client bound to one backend and model
pub struct OpenAIClient {
    backend: Backend,
    model: String,
    api_key: Option<String>,
    base_url: String,
    temperature: f32,
    max_tokens: u32,
    headers: Vec<(String, String)>,
    http_client: Client,
    rate_limiter: Arc<RateLimiter>,
}

impl OpenAIClient {
    /// Create a new client; the base URL must be http(s)
    pub fn new(
        backend: Backend,
        model: impl Into<String>,
        api_key: Option<String>,
        base_url: impl Into<String>,
    ) -> ProviderResult<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ProviderError::Config(format!(
                "Invalid base URL for {}: {}",
                backend, base_url
            )));
        }

        let model = model.into();
        if model.trim().is_empty() {
            return Err(ProviderError::Config("Model name is empty".to_string()));
        }

        Ok(Self {
            backend,
            model,
            api_key,
            base_url,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            headers: Vec::new(),
            http_client: Client::new(),
            rate_limiter: Arc::new(RateLimiter::unlimited()),
        })
    }

    /// Set sampling temperature and output budget
    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    /// Set a transport-level timeout on every request
    pub fn with_timeout(mut self, timeout: Duration) -> ProviderResult<Self> {
        self.http_client = Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    /// Add a header sent with every request
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Share a rate limiter with other clients on the same backend
    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.rate_limiter = limiter;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    fn request_body<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    /// Null for some refusals; treated as an empty answer
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Extract the reply text and usage from a response body
fn parse_chat_response(body: &str, fallback_model: &str) -> ProviderResult<CompletionResponse> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::Parse(format!("Invalid completion response: {}", e)))?;

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::Parse("No choices in response".to_string()))?;

    let usage = response.usage.map(|u| TokenUsage {
        prompt: u.prompt_tokens,
        completion: u.completion_tokens,
        total: u.total_tokens.unwrap_or(u.prompt_tokens + u.completion_tokens),
    });

    Ok(CompletionResponse {
        content: choice.message.content.unwrap_or_default(),
        model: response.model.unwrap_or_else(|| fallback_model.to_string()),
        usage,
        finish_reason: choice.finish_reason.unwrap_or_else(|| "unknown".to_string()),
    })
}

#[async_trait]
impl LLMProvider for OpenAIClient {
    fn name(&self) -> &str {
        self.backend.as_str()
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn ready(&self) {
        self.rate_limiter.acquire().await;
    }

    async fn complete(&self, prompt: &str) -> ProviderResult<CompletionResponse> {
        let mut request = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Content-Type", "application/json")
            .json(&self.request_body(prompt));

        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        for (name, value) in &self.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                tracing::debug!("{} request timed out: {}", self.backend, e);
            }
            ProviderError::Http(e)
        })?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = match serde_json::from_str::<ErrorBody>(&body) {
                Ok(error) => error.error.message,
                Err(_) => format!("HTTP {}: {}", status.as_u16(), body),
            };

            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        parse_chat_response(&body, &self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let client = OpenAIClient::new(Backend::OpenAI, "gpt-4o-mini", None, "https://api.openai.com/v1/")
            .unwrap()
            .with_sampling(0.0, 10);
        let body = serde_json::to_value(client.request_body("Answer: A or B?")).unwrap();

        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "Answer: A or B?");
        assert_eq!(body["max_tokens"], 10);
        assert_eq!(client.base_url(), "https://api.openai.com/v1");
    }

    #[tokio::test]
    async fn test_ready_takes_a_rate_limit_slot() {
        let limiter = Arc::new(RateLimiter::new(2));
        let client = OpenAIClient::new(Backend::Ollama, "llama3", None, "http://127.0.0.1:9/v1")
            .unwrap()
            .with_rate_limiter(limiter.clone());

        client.ready().await;
        assert_eq!(limiter.requests_in_window().await, 1);

        // An unreachable endpoint fails without touching the limiter
        assert!(client.complete("hello").await.is_err());
        assert_eq!(limiter.requests_in_window().await, 1);
    }

    #[test]
    fn test_invalid_base_url() {
        let result = OpenAIClient::new(Backend::Ollama, "llama3", None, "localhost:11434");
        assert!(matches!(result, Err(ProviderError::Config(_))));
    }

    #[test]
    fn test_parse_response() {
        let body = r#"{
            "model": "meta-llama/llama-3-8b-instruct",
            "choices": [{"message": {"role": "assistant", "content": " B"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 52, "completion_tokens": 1, "total_tokens": 53}
        }"#;

        let response = parse_chat_response(body, "fallback").unwrap();
        assert_eq!(response.content, " B");
        assert_eq!(response.model, "meta-llama/llama-3-8b-instruct");
        assert_eq!(response.usage.unwrap().total, 53);
    }

    #[test]
    fn test_parse_null_content_and_missing_usage() {
        let body = r#"{"choices": [{"message": {"content": null}, "finish_reason": null}]}"#;
        let response = parse_chat_response(body, "llama3").unwrap();
        assert_eq!(response.content, "");
        assert_eq!(response.model, "llama3");
        assert!(response.usage.is_none());
    }

    #[test]
    fn test_parse_empty_choices() {
        let result = parse_chat_response(r#"{"choices": []}"#, "m");
        assert!(matches!(result, Err(ProviderError::Parse(_))));
    }

    #[test]
    fn test_parse_garbage() {
        let result = parse_chat_response("<html>bad gateway</html>", "m");
        assert!(matches!(result, Err(ProviderError::Parse(_))));
    }
}
