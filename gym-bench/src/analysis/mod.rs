//! Answer parsing, grading and score aggregation

pub mod metrics;
pub mod parser;
pub mod scoring;

pub use metrics::{
    accuracy_by_category, accuracy_by_difficulty, percentage, BenchmarkResult, EvaluationResult,
};
pub use parser::parse_answer;
pub use scoring::{correct_letter, grade};
