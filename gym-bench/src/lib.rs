//! Gym knowledge benchmark for LLM providers
//!
//! This crate runs chat models through a multiple-choice question bank on
//! anatomy, exercise technique, training programming, nutrition, injury and
//! biomechanics, grades their answers and reports accuracy.
//!
//! # Features
//!
//! - OpenAI-compatible client for the gateway, vendor APIs and local servers
//! - Fail-fast single-model evaluation with per-call timeouts
//! - Batched multi-model sweeps where one failing model never voids the rest
//! - Cost-tier ranking of the gateway catalog
//! - JSON result store with a "has this model been tested" cache
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use gym_bench::{
//!     config::{Config, Credentials},
//!     providers::{Backend, ClientFactory, HttpClientFactory, ModelConfig},
//!     questions::load_questions,
//!     reporting::format_results_table,
//!     runner::{Evaluator, EvaluatorConfig},
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_or_default();
//!     let factory = HttpClientFactory::from_config(&config, Credentials::from_env(&config));
//!
//!     let client = factory.create(&ModelConfig::new(
//!         Backend::OpenRouter,
//!         "meta-llama/llama-3-8b-instruct:free",
//!     ))?;
//!     let questions = load_questions(&config.paths.questions_dir, None)?;
//!
//!     let result = Evaluator::new(client, EvaluatorConfig::default())
//!         .evaluate(&questions)
//!         .await?;
//!     println!("{}", format_results_table(&result));
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod catalog;
pub mod config;
pub mod providers;
pub mod questions;
pub mod reporting;
pub mod runner;

pub use config::{Config, Credentials};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::analysis::{parse_answer, BenchmarkResult, EvaluationResult};
    pub use crate::catalog::{rank, recommended_models, CatalogClient, CatalogModel, ModelWithTier, Tier};
    pub use crate::config::{Config, Credentials};
    pub use crate::providers::{
        create_client, Backend, ClientFactory, CompletionResponse, HttpClientFactory, LLMProvider,
        ModelConfig, ProviderError, ProviderResult,
    };
    pub use crate::questions::{load_questions, Category, Difficulty, Question};
    pub use crate::reporting::{
        calculate_metrics, compare_results, format_report, format_results_table, Report,
        ResultStore, ResultsCache,
    };
    pub use crate::runner::{BatchReport, Evaluator, EvaluatorConfig, ModelOutcome, Orchestrator};
}
