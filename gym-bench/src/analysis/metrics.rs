//! Per-question results and their aggregation into a benchmark score

use chrono::{DateTime, SubsecRound, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::hash::Hash;

use crate::providers::TokenUsage;
use crate::questions::{Category, Difficulty};

/// Outcome of one question for one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub question_id: String,
    pub question: String,
    /// Parsed answer; may be empty or a non-label character
    pub model_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
    pub category: Category,
    pub difficulty: Difficulty,
    /// Wall-clock time of the single completion call
    pub time_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<TokenUsage>,
}

/// Aggregate score of one model over a question set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkResult {
    pub model_name: String,
    pub timestamp: DateTime<Utc>,
    pub total_questions: usize,
    pub correct_answers: usize,
    /// Percentage in `0.0..=100.0`
    pub accuracy: f64,
    /// Span of the whole run, not the sum of per-question times
    pub total_time_ms: u64,
    pub average_time_ms: f64,
    /// Every category is present, 0 when none were asked
    pub accuracy_by_category: IndexMap<Category, f64>,
    pub accuracy_by_difficulty: IndexMap<Difficulty, f64>,
    pub results: Vec<EvaluationResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<f64>,
}

impl BenchmarkResult {
    /// Build the aggregate from ordered per-question results
    pub fn from_results(
        model_name: impl Into<String>,
        results: Vec<EvaluationResult>,
        total_time_ms: u64,
    ) -> Self {
        let total_questions = results.len();
        let correct_answers = results.iter().filter(|r| r.is_correct).count();

        let average_time_ms = if total_questions == 0 {
            0.0
        } else {
            total_time_ms as f64 / total_questions as f64
        };

        let total_tokens = results
            .iter()
            .filter_map(|r| r.tokens)
            .map(|t| u64::from(t.total))
            .reduce(|a, b| a + b);

        Self {
            model_name: model_name.into(),
            timestamp: Utc::now().trunc_subsecs(3),
            total_questions,
            correct_answers,
            accuracy: percentage(correct_answers, total_questions),
            total_time_ms,
            average_time_ms,
            accuracy_by_category: accuracy_by_category(&results),
            accuracy_by_difficulty: accuracy_by_difficulty(&results),
            results,
            total_tokens,
            estimated_cost: None,
        }
    }

    /// Price the run from per-token USD prices and the reported usage.
    ///
    /// Stays `None` when the backend reported no token counts.
    pub fn with_estimated_cost(mut self, prompt_price: f64, completion_price: f64) -> Self {
        self.estimated_cost = self
            .results
            .iter()
            .filter_map(|r| r.tokens)
            .map(|t| f64::from(t.prompt) * prompt_price + f64::from(t.completion) * completion_price)
            .reduce(|a, b| a + b);
        self
    }

    /// Questions asked in a category
    pub fn category_count(&self, category: Category) -> usize {
        self.results.iter().filter(|r| r.category == category).count()
    }

    /// Questions asked at a difficulty
    pub fn difficulty_count(&self, difficulty: Difficulty) -> usize {
        self.results.iter().filter(|r| r.difficulty == difficulty).count()
    }
}

/// `100 * part / whole`, 0 for an empty whole
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Accuracy per category, keyed in enumeration order
pub fn accuracy_by_category(results: &[EvaluationResult]) -> IndexMap<Category, f64> {
    accuracy_by(results, Category::all(), |r| r.category)
}

/// Accuracy per difficulty, keyed in enumeration order
pub fn accuracy_by_difficulty(results: &[EvaluationResult]) -> IndexMap<Difficulty, f64> {
    accuracy_by(results, Difficulty::all(), |r| r.difficulty)
}

fn accuracy_by<K, F>(results: &[EvaluationResult], keys: Vec<K>, key_of: F) -> IndexMap<K, f64>
where
    K: Hash + Eq + Copy,
    F: Fn(&EvaluationResult) -> K,
{
    keys.into_iter()
        .map(|key| {
            let (asked, correct) = results
                .iter()
                .filter(|r| key_of(r) == key)
                .fold((0, 0), |(asked, correct), r| {
                    (asked + 1, correct + usize::from(r.is_correct))
                });
            (key, percentage(correct, asked))
        })
        .collect()
}
