//! Cost tiers and recommendation ranking over a catalog snapshot
//!
//! Everything here is pure; ordering among equal priorities always follows
//! catalog order.

use serde::{Deserialize, Serialize};

use super::CatalogModel;

/// Providers given a ranking bonus
pub const MAJOR_PROVIDERS: [&str; 7] = [
    "openai",
    "anthropic",
    "google",
    "meta-llama",
    "mistralai",
    "nvidia",
    "cohere",
];

/// Prompt unit price below which a paid model counts as budget
pub const BUDGET_PROMPT_PRICE: f64 = 0.0005;
/// Context length earning the long-context bonus
pub const LONG_CONTEXT: u64 = 8000;
/// Estimated prompt tokens for one full benchmark run
pub const RUN_PROMPT_TOKENS: f64 = 3400.0;
/// Estimated completion tokens for one full benchmark run
pub const RUN_COMPLETION_TOKENS: f64 = 68.0;

const MAJOR_PROVIDER_BONUS: u32 = 20;
const LONG_CONTEXT_BONUS: u32 = 5;

/// Cost classification of a catalog model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Free,
    Budget,
    Premium,
}

impl Tier {
    pub fn all() -> Vec<Tier> {
        vec![Tier::Free, Tier::Budget, Tier::Premium]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Budget => "budget",
            Tier::Premium => "premium",
        }
    }

    /// Base ranking priority
    pub fn base_priority(&self) -> u32 {
        match self {
            Tier::Free => 100,
            Tier::Budget => 50,
            Tier::Premium => 10,
        }
    }

    /// How many of this tier a recommendation keeps
    pub fn cap(&self) -> usize {
        match self {
            Tier::Free => 20,
            Tier::Budget => 15,
            Tier::Premium => 10,
        }
    }
}

impl std::str::FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "free" => Ok(Tier::Free),
            "budget" => Ok(Tier::Budget),
            "premium" => Ok(Tier::Premium),
            _ => Err(format!("Unknown tier: {} (expected free, budget or premium)", s)),
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A catalog model with its tier, estimated run cost and priority
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelWithTier {
    #[serde(flatten)]
    pub model: CatalogModel,
    pub tier: Tier,
    /// Approximate cost of one full run, e.g. `$0.012`
    pub estimated_cost: String,
    pub priority: u32,
}

impl ModelWithTier {
    pub fn id(&self) -> &str {
        &self.model.id
    }

    pub fn provider(&self) -> &str {
        self.model.provider()
    }
}

/// Classify one model.
///
/// Unparseable prices make a model premium with an estimated cost of zero.
pub fn categorize_model(model: &CatalogModel) -> ModelWithTier {
    let prompt = model.pricing.prompt_price();
    let completion = model.pricing.completion_price();
    let run_cost = prompt.unwrap_or(0.0) * RUN_PROMPT_TOKENS
        + completion.unwrap_or(0.0) * RUN_COMPLETION_TOKENS;

    let (tier, estimated_cost) = match (prompt, completion) {
        (Some(p), Some(c)) if p == 0.0 && c == 0.0 => (Tier::Free, "$0.00".to_string()),
        (Some(p), _) if p < BUDGET_PROMPT_PRICE => (Tier::Budget, format!("${:.3}", run_cost)),
        _ => (Tier::Premium, format!("${:.2}", run_cost)),
    };

    let mut priority = tier.base_priority();
    if MAJOR_PROVIDERS.contains(&model.provider()) {
        priority += MAJOR_PROVIDER_BONUS;
    }
    if model.context_length.unwrap_or(0) >= LONG_CONTEXT {
        priority += LONG_CONTEXT_BONUS;
    }

    ModelWithTier {
        model: model.clone(),
        tier,
        estimated_cost,
        priority,
    }
}

/// Classify every model and order by descending priority (stable)
pub fn rank(models: &[CatalogModel]) -> Vec<ModelWithTier> {
    let mut ranked: Vec<ModelWithTier> = models.iter().map(categorize_model).collect();
    ranked.sort_by(|a, b| b.priority.cmp(&a.priority));
    ranked
}

/// Ranked models capped per tier: free, then budget, then premium
pub fn recommended_models(models: &[CatalogModel]) -> Vec<ModelWithTier> {
    let ranked = rank(models);

    Tier::all()
        .into_iter()
        .flat_map(|tier| {
            ranked
                .iter()
                .filter(move |m| m.tier == tier)
                .take(tier.cap())
                .cloned()
                .collect::<Vec<_>>()
        })
        .collect()
}

pub fn recommended_by_tier(models: &[CatalogModel], tier: Tier) -> Vec<ModelWithTier> {
    recommended_models(models)
        .into_iter()
        .filter(|m| m.tier == tier)
        .collect()
}

/// Models whose id starts with `{provider}/`
pub fn filter_by_provider(models: &[ModelWithTier], provider: &str) -> Vec<ModelWithTier> {
    let prefix = format!("{}/", provider);
    models
        .iter()
        .filter(|m| m.id().starts_with(&prefix))
        .cloned()
        .collect()
}

pub fn top_models(models: &[CatalogModel], limit: usize) -> Vec<ModelWithTier> {
    let mut recommended = recommended_models(models);
    recommended.truncate(limit);
    recommended
}
