//! End-to-end evaluation tests against scripted providers.
//!
//! Covers the single-model run, the batched multi-model sweep, and the
//! result store and cache the CLI builds on top of them.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use gym_bench::analysis::BenchmarkResult;
use gym_bench::providers::{
    Backend, ClientFactory, CompletionResponse, LLMProvider, ModelConfig, ProviderError,
    ProviderResult,
};
use gym_bench::questions::{Category, Difficulty, Question};
use gym_bench::reporting::{format_report, Report, ResultStore, ResultsCache};
use gym_bench::runner::{Evaluator, EvaluatorConfig, Orchestrator};

// =============================================================================
// Helpers
// =============================================================================

/// Replies with a fixed answer per question text, "A" otherwise
struct ScriptedProvider {
    model: String,
    replies: HashMap<String, String>,
    fail: bool,
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> ProviderResult<CompletionResponse> {
        if self.fail {
            return Err(ProviderError::Api {
                status: 503,
                message: "upstream unavailable".to_string(),
            });
        }

        let reply = self
            .replies
            .iter()
            .find(|(question, _)| prompt.contains(question.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| "A".to_string());
        Ok(CompletionResponse::text(reply))
    }
}

/// Builds scripted providers; models named `broken/*` fail every call and
/// `missing/*` cannot be constructed at all
struct ScriptedFactory;

impl ClientFactory for ScriptedFactory {
    fn create(&self, model: &ModelConfig) -> ProviderResult<Arc<dyn LLMProvider>> {
        if model.model_name.starts_with("missing/") {
            return Err(ProviderError::Config("OPENROUTER_API_KEY not found".to_string()));
        }

        Ok(Arc::new(ScriptedProvider {
            model: model.model_name.clone(),
            replies: HashMap::new(),
            fail: model.model_name.starts_with("broken/"),
        }))
    }
}

fn question_bank() -> Vec<Question> {
    vec![
        Question::new(
            "anat-001",
            "Which muscle extends the knee?",
            ["Quadriceps", "Hamstrings", "Soleus", "Adductors"],
            0,
            Category::Anatomy,
            Difficulty::Easy,
        ),
        Question::new(
            "nutr-001",
            "How many kcal in a gram of fat?",
            ["4", "9", "7", "2"],
            1,
            Category::Nutrition,
            Difficulty::Medium,
        ),
        Question::new(
            "tech-001",
            "Where does the bar sit in a high-bar squat?",
            ["Lower back", "Neck", "Upper trapezius", "Rear deltoids"],
            2,
            Category::Technique,
            Difficulty::Hard,
        ),
        Question::new(
            "prog-001",
            "Which rep range builds maximal strength?",
            ["12-15", "20-30", "50+", "1-5"],
            3,
            Category::Programming,
            Difficulty::Easy,
        ),
    ]
}

// =============================================================================
// Single model
// =============================================================================

#[tokio::test]
async fn test_scored_run_with_noisy_replies() {
    let replies = HashMap::from([
        ("Which muscle extends the knee?".to_string(), " a) Quadriceps".to_string()),
        ("How many kcal in a gram of fat?".to_string(), "b) 9 kcal".to_string()),
        ("Where does the bar sit".to_string(), "D".to_string()),
        ("Which rep range".to_string(), "".to_string()),
    ]);
    let provider = Arc::new(ScriptedProvider {
        model: "acme/gym-coach".to_string(),
        replies,
        fail: false,
    });

    let result = Evaluator::new(provider, EvaluatorConfig::default())
        .evaluate(&question_bank())
        .await
        .unwrap();

    assert_eq!(result.model_name, "acme/gym-coach");
    assert_eq!(result.total_questions, 4);
    assert_eq!(result.correct_answers, 2);
    assert_eq!(result.accuracy, 50.0);

    let answers: Vec<_> = result.results.iter().map(|r| r.model_answer.as_str()).collect();
    assert_eq!(answers, vec!["A", "B", "D", ""]);
    assert!(result.results[0].is_correct);
    assert!(!result.results[3].is_correct);

    assert_eq!(result.accuracy_by_category[&Category::Anatomy], 100.0);
    assert_eq!(result.accuracy_by_category[&Category::Nutrition], 100.0);
    assert_eq!(result.accuracy_by_category[&Category::Technique], 0.0);
    assert_eq!(result.accuracy_by_category[&Category::Injury], 0.0);
    assert_eq!(result.accuracy_by_difficulty[&Difficulty::Easy], 50.0);
    assert_eq!(result.accuracy_by_difficulty.len(), 3);
}

#[tokio::test]
async fn test_parallel_run_matches_sequential() {
    let make = || {
        Arc::new(ScriptedProvider {
            model: "acme/gym-coach".to_string(),
            replies: HashMap::from([("kcal".to_string(), "B".to_string())]),
            fail: false,
        })
    };

    let sequential = Evaluator::new(make(), EvaluatorConfig::default())
        .evaluate(&question_bank())
        .await
        .unwrap();
    let parallel = Evaluator::new(
        make(),
        EvaluatorConfig {
            question_parallelism: 3,
            ..EvaluatorConfig::default()
        },
    )
    .evaluate(&question_bank())
    .await
    .unwrap();

    let ids = |r: &BenchmarkResult| r.results.iter().map(|e| e.question_id.clone()).collect::<Vec<_>>();
    assert_eq!(ids(&sequential), ids(&parallel));
    assert_eq!(sequential.correct_answers, parallel.correct_answers);
    assert_eq!(parallel.correct_answers, 2);
}

// =============================================================================
// Multi-model sweep
// =============================================================================

#[tokio::test]
async fn test_sweep_isolates_failures() {
    let models = vec![
        ModelConfig::new(Backend::OpenRouter, "acme/one"),
        ModelConfig::new(Backend::OpenRouter, "broken/two"),
        ModelConfig::new(Backend::OpenRouter, "missing/three"),
        ModelConfig::new(Backend::OpenRouter, "acme/four"),
        ModelConfig::new(Backend::OpenRouter, "acme/five"),
    ];

    let report = Orchestrator::new(Arc::new(ScriptedFactory), question_bank(), EvaluatorConfig::default())
        .run_batch(models, 2)
        .await;

    assert_eq!(report.batches, 3);
    let order: Vec<_> = report.outcomes.iter().map(|o| o.model.as_str()).collect();
    assert_eq!(order, vec!["acme/one", "broken/two", "missing/three", "acme/four", "acme/five"]);

    assert_eq!(report.completed().len(), 3);
    let failed = report.failed();
    assert_eq!(failed.len(), 2);
    assert_eq!(failed[0].0, "broken/two");
    assert!(failed[0].1.contains("503"));
    assert!(failed[1].1.contains("OPENROUTER_API_KEY"));

    // Always-A scores one of four on this bank
    for result in report.completed() {
        assert_eq!(result.accuracy, 25.0);
    }
}

// =============================================================================
// Persistence
// =============================================================================

#[tokio::test]
async fn test_saved_results_feed_the_cache() {
    let dir = tempfile::tempdir().unwrap();
    let store = ResultStore::new(dir.path().join("results"));

    let report = Orchestrator::new(Arc::new(ScriptedFactory), question_bank(), EvaluatorConfig::default())
        .run_batch(
            vec![
                ModelConfig::new(Backend::OpenRouter, "meta-llama/llama-3-8b-instruct:free"),
                ModelConfig::new(Backend::OpenRouter, "broken/model"),
            ],
            4,
        )
        .await;

    for result in report.completed() {
        store.save_result(result).unwrap();
    }
    let results: Vec<BenchmarkResult> = report.completed().into_iter().cloned().collect();
    store
        .save_comparison(vec!["meta-llama/llama-3-8b-instruct:free".to_string()], results)
        .unwrap();

    let files = store.list().unwrap();
    assert_eq!(files.len(), 2);
    assert!(files.iter().any(|f| f.starts_with("comparison_")));
    let single = files
        .iter()
        .find(|f| f.starts_with("meta-llama_llama-3-8b-instruct:free_"))
        .unwrap();

    let loaded = store.load(single).unwrap();
    assert!(matches!(loaded, Report::Single(ref r) if r.correct_answers == 1));
    assert!(format_report(&loaded).contains("Benchmark Results: meta-llama/llama-3-8b-instruct:free"));

    let cache = ResultsCache::new(store.dir());
    assert!(cache.has_result_for_model("meta-llama/llama-3-8b-instruct:free"));
    assert!(!cache.has_result_for_model("broken/model"));
    assert_eq!(
        cache.untested(["meta-llama/llama-3-8b-instruct:free", "broken/model"]),
        vec!["broken/model"]
    );
}
