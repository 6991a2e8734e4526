//! Results reporting
//!
//! Pure text rendering of computed scores plus the on-disk result store and
//! the cache index built over it.

pub mod cache;
pub mod store;

pub use cache::{CachedResult, ResultsCache};
pub use store::{comparison_filename, result_filename, ResultStore, StoreError};

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::analysis::BenchmarkResult;
use crate::questions::{Category, Difficulty};

/// A persisted report: one model's result, or a multi-model comparison.
///
/// On disk a single result is the plain result object; a comparison is
/// `{ "models": [...], "results": [...] }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Report {
    Comparison {
        models: Vec<String>,
        results: Vec<BenchmarkResult>,
    },
    Single(BenchmarkResult),
}

impl Report {
    pub fn comparison(models: Vec<String>, results: Vec<BenchmarkResult>) -> Self {
        Report::Comparison { models, results }
    }

    /// Every result carried by the report
    pub fn results(&self) -> Vec<&BenchmarkResult> {
        match self {
            Report::Single(result) => vec![result],
            Report::Comparison { results, .. } => results.iter().collect(),
        }
    }
}

/// Display-ready summary of one result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayMetrics {
    pub accuracy: String,
    pub total_questions: usize,
    pub correct_answers: usize,
    pub average_time_seconds: String,
    pub total_time_seconds: String,
}

fn seconds(ms: f64) -> String {
    format!("{:.2}s", ms / 1000.0)
}

pub fn calculate_metrics(result: &BenchmarkResult) -> DisplayMetrics {
    DisplayMetrics {
        accuracy: format!("{:.2}%", result.accuracy),
        total_questions: result.total_questions,
        correct_answers: result.correct_answers,
        average_time_seconds: seconds(result.average_time_ms),
        total_time_seconds: seconds(result.total_time_ms as f64),
    }
}

/// Framed text report of one result
pub fn format_results_table(result: &BenchmarkResult) -> String {
    let rule = "=".repeat(80);
    let mut lines = vec![
        rule.clone(),
        format!("Benchmark Results: {}", result.model_name),
        format!(
            "Timestamp: {}",
            result.timestamp.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
        ),
        rule.clone(),
        String::new(),
        "Overall Performance:".to_string(),
        format!(
            "  Accuracy: {:.2}% ({}/{})",
            result.accuracy, result.correct_answers, result.total_questions
        ),
        format!("  Total Time: {}", seconds(result.total_time_ms as f64)),
        format!("  Average Time: {} per question", seconds(result.average_time_ms)),
        String::new(),
        "Accuracy by Category:".to_string(),
    ];

    for category in Category::all() {
        let accuracy = result.accuracy_by_category.get(&category).copied().unwrap_or(0.0);
        lines.push(breakdown_line(category.as_str(), accuracy, result.category_count(category)));
    }
    lines.push(String::new());

    lines.push("Accuracy by Difficulty:".to_string());
    for difficulty in Difficulty::all() {
        let accuracy = result.accuracy_by_difficulty.get(&difficulty).copied().unwrap_or(0.0);
        lines.push(breakdown_line(
            difficulty.as_str(),
            accuracy,
            result.difficulty_count(difficulty),
        ));
    }
    lines.push(String::new());
    lines.push(rule);

    lines.join("\n")
}

fn breakdown_line(label: &str, accuracy: f64, count: usize) -> String {
    format!("  {:<15}: {:>6.2}% ({} questions)", label, accuracy, count)
}

/// Results ordered by descending accuracy, ties in input order
pub fn rank_by_accuracy<'a>(results: impl IntoIterator<Item = &'a BenchmarkResult>) -> Vec<&'a BenchmarkResult> {
    let mut sorted: Vec<_> = results.into_iter().collect();
    sorted.sort_by(|a, b| b.accuracy.partial_cmp(&a.accuracy).unwrap_or(Ordering::Equal));
    sorted
}

/// Side-by-side table of several results
pub fn compare_results<'a>(results: impl IntoIterator<Item = &'a BenchmarkResult>) -> String {
    let rule = "=".repeat(100);
    let mut lines = vec![
        rule.clone(),
        "Model Comparison".to_string(),
        rule.clone(),
        String::new(),
        format!("{:<40}{:>12}{:>15}{:>18}", "Model", "Accuracy", "Avg Time", "Total Questions"),
        "-".repeat(100),
    ];

    for result in rank_by_accuracy(results) {
        lines.push(format!(
            "{:<40}{:>12}{:>15}{:>18}",
            result.model_name,
            format!("{:.2}%", result.accuracy),
            seconds(result.average_time_ms),
            result.total_questions
        ));
    }

    lines.push(String::new());
    lines.push(rule);
    lines.join("\n")
}

/// Render any report
pub fn format_report(report: &Report) -> String {
    match report {
        Report::Single(result) => format_results_table(result),
        Report::Comparison { results, .. } => compare_results(results),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::EvaluationResult;

    fn answered(id: &str, category: Category, difficulty: Difficulty, is_correct: bool) -> EvaluationResult {
        EvaluationResult {
            question_id: id.to_string(),
            question: "?".to_string(),
            model_answer: "A".to_string(),
            correct_answer: "A".to_string(),
            is_correct,
            category,
            difficulty,
            time_ms: 1000,
            tokens: None,
        }
    }

    fn sample(name: &str, correct: usize, total: usize) -> BenchmarkResult {
        let results = (0..total)
            .map(|i| answered(&format!("q{}", i), Category::Anatomy, Difficulty::Easy, i < correct))
            .collect();
        BenchmarkResult::from_results(name, results, 1000 * total as u64)
    }

    #[test]
    fn test_calculate_metrics() {
        let metrics = calculate_metrics(&sample("m", 8, 10));
        assert_eq!(metrics.accuracy, "80.00%");
        assert_eq!(metrics.correct_answers, 8);
        assert_eq!(metrics.average_time_seconds, "1.00s");
        assert_eq!(metrics.total_time_seconds, "10.00s");
    }

    #[test]
    fn test_format_results_table() {
        let table = format_results_table(&sample("meta-llama/llama-3-8b-instruct:free", 1, 2));
        let lines: Vec<_> = table.lines().collect();

        assert_eq!(lines[0], "=".repeat(80));
        assert_eq!(lines[1], "Benchmark Results: meta-llama/llama-3-8b-instruct:free");
        assert!(table.contains("  Accuracy: 50.00% (1/2)"));
        assert!(table.contains("  anatomy        :  50.00% (2 questions)"));
        assert!(table.contains("  technique      :   0.00% (0 questions)"));
        assert!(table.contains("  hard           :   0.00% (0 questions)"));
        assert_eq!(lines.last().copied(), Some("=".repeat(80).as_str()));
    }

    #[test]
    fn test_compare_results_sorted_stable() {
        let results = vec![sample("low", 1, 4), sample("high-a", 3, 4), sample("high-b", 3, 4)];
        let table = compare_results(&results);
        let rows: Vec<_> = table.lines().skip(6).take(3).collect();

        assert!(rows[0].starts_with("high-a"));
        assert!(rows[1].starts_with("high-b"));
        assert!(rows[2].starts_with("low"));
        assert_eq!(rows[0].len(), 40 + 12 + 15 + 18);
        assert!(rows[0].contains("75.00%"));
    }

    #[test]
    fn test_report_untagged_json() {
        let single = Report::Single(sample("solo", 1, 1));
        let json = serde_json::to_value(&single).unwrap();
        assert_eq!(json["modelName"], "solo");
        assert!(json.get("models").is_none());

        let comparison = Report::comparison(vec!["a".into(), "b".into()], vec![sample("a", 1, 1), sample("b", 0, 1)]);
        let text = serde_json::to_string(&comparison).unwrap();
        let parsed: Report = serde_json::from_str(&text).unwrap();
        assert!(matches!(parsed, Report::Comparison { ref models, .. } if models.len() == 2));
        assert_eq!(parsed.results().len(), 2);

        let parsed_single: Report = serde_json::from_value(json).unwrap();
        assert!(matches!(parsed_single, Report::Single(_)));
        assert!(format_report(&parsed_single).starts_with(&"=".repeat(80)));
    }
}
