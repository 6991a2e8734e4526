//! Model catalog discovery
//!
//! Fetches the gateway's model listing and offers pure helpers to filter
//! and display it. Fetch failures are demoted to an empty catalog by
//! [`CatalogClient::fetch_available_models`].

pub mod ranker;

pub use ranker::{
    categorize_model, filter_by_provider, rank, recommended_by_tier, recommended_models,
    top_models, ModelWithTier, Tier,
};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::time::Duration;

use crate::config::CatalogSettings;

/// Providers favoured by [`filter_popular_models`]
pub const POPULAR_PROVIDERS: [&str; 5] = ["openai", "anthropic", "google", "meta-llama", "mistralai"];

/// Known free models, used when the catalog is unavailable
pub const FREE_MODELS: [&str; 6] = [
    "meta-llama/llama-3-8b-instruct:free",
    "google/gemini-flash-1.5:free",
    "mistralai/mistral-7b-instruct:free",
    "nousresearch/nous-capybara-7b:free",
    "openchat/openchat-7b:free",
    "gryphe/mythomist-7b:free",
];

/// Well-known paid models
pub const POPULAR_MODELS: [&str; 10] = [
    "openai/gpt-4",
    "openai/gpt-4-turbo",
    "openai/gpt-3.5-turbo",
    "anthropic/claude-3-opus",
    "anthropic/claude-3-sonnet",
    "anthropic/claude-3-haiku",
    "google/gemini-pro",
    "google/gemini-1.5-pro",
    "meta-llama/llama-3-70b",
    "mistralai/mixtral-8x7b",
];

/// Unit prices as published by the catalog (decimal strings, per token)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub completion: String,
}

impl Pricing {
    pub fn new(prompt: impl Into<String>, completion: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            completion: completion.into(),
        }
    }

    /// Prompt price, `None` when the catalog value is not a number
    pub fn prompt_price(&self) -> Option<f64> {
        self.prompt.trim().parse().ok()
    }

    pub fn completion_price(&self) -> Option<f64> {
        self.completion.trim().parse().ok()
    }

    /// Both prices parse and equal zero
    pub fn is_free(&self) -> bool {
        self.prompt_price() == Some(0.0) && self.completion_price() == Some(0.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Architecture {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokenizer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instruct_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopProvider {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_completion_tokens: Option<u64>,
}

/// One model record from the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogModel {
    /// `provider/model[:variant]`
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub pricing: Pricing,
    #[serde(default)]
    pub context_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub architecture: Option<Architecture>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_provider: Option<TopProvider>,
}

impl CatalogModel {
    pub fn new(id: impl Into<String>, pricing: Pricing, context_length: u64) -> Self {
        Self {
            id: id.into(),
            name: None,
            description: None,
            pricing,
            context_length: Some(context_length),
            architecture: None,
            top_provider: None,
        }
    }

    /// Provider prefix of the id (`openai` in `openai/gpt-4`)
    pub fn provider(&self) -> &str {
        self.id.split('/').next().unwrap_or_default()
    }
}

#[derive(Deserialize)]
struct CatalogResponse {
    #[serde(default)]
    data: Vec<CatalogModel>,
}

/// Catalog errors
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Catalog API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Client for the gateway's model listing
pub struct CatalogClient {
    http_client: Client,
    url: String,
    api_key: Option<String>,
    referer: String,
    title: String,
}

impl CatalogClient {
    pub fn new(settings: &CatalogSettings, api_key: Option<String>) -> Self {
        Self {
            http_client: Client::new(),
            url: settings.url.clone(),
            api_key,
            referer: settings.referer.clone(),
            title: settings.title.clone(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, CatalogError> {
        self.http_client = Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    /// Fetch the full listing
    pub async fn fetch_models(&self) -> Result<Vec<CatalogModel>, CatalogError> {
        let mut request = self
            .http_client
            .get(&self.url)
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title);

        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(CatalogError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: CatalogResponse =
            serde_json::from_str(&body).map_err(|e| CatalogError::Parse(e.to_string()))?;
        tracing::debug!("Catalog returned {} models", parsed.data.len());
        Ok(parsed.data)
    }

    /// Fetch the listing, treating any failure as an empty catalog
    pub async fn fetch_available_models(&self) -> Vec<CatalogModel> {
        match self.fetch_models().await {
            Ok(models) => models,
            Err(e) => {
                tracing::warn!("Failed to fetch models from catalog: {}", e);
                Vec::new()
            }
        }
    }
}

/// Models marked `:free` or priced at zero
pub fn filter_free_models(models: &[CatalogModel]) -> Vec<CatalogModel> {
    models
        .iter()
        .filter(|m| m.id.contains(":free") || m.pricing.is_free())
        .cloned()
        .collect()
}

/// Up to 20 models from well-known providers, longest context per price first
pub fn filter_popular_models(models: &[CatalogModel]) -> Vec<CatalogModel> {
    let score = |m: &CatalogModel| {
        let price = m.pricing.prompt_price().unwrap_or(f64::INFINITY);
        m.context_length.unwrap_or(0) as f64 / (price + 0.0001)
    };

    let mut popular: Vec<CatalogModel> = models
        .iter()
        .filter(|m| POPULAR_PROVIDERS.contains(&m.provider()))
        .cloned()
        .collect();
    popular.sort_by(|a, b| score(b).partial_cmp(&score(a)).unwrap_or(Ordering::Equal));
    popular.truncate(20);
    popular
}

/// One-line listing: padded id and prompt price
pub fn format_model_display(model: &CatalogModel) -> String {
    let cost = match model.pricing.prompt_price() {
        Some(price) if price == 0.0 => "FREE".to_string(),
        Some(price) => format!("${:.4}/1K tokens", price),
        None => "unknown".to_string(),
    };
    format!("{:<50} {:>20}", model.id, cost)
}
