//! Question definitions and loading

pub mod categories;
pub mod loader;

pub use categories::{Category, Difficulty};
pub use loader::{load_questions, load_questions_from_file, load_questions_from_str, LoadError};

use serde::{Deserialize, Serialize};

/// Labels for the four answer choices, in choice order
pub const CHOICE_LABELS: [char; 4] = ['A', 'B', 'C', 'D'];

/// A multiple-choice question from the question bank
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub question: String,
    pub choices: [String; 4],
    /// Zero-based index into `choices`
    pub answer: u8,
    pub category: Category,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub explanation: String,
}

impl Question {
    /// Create a new question with an empty explanation
    pub fn new(
        id: impl Into<String>,
        question: impl Into<String>,
        choices: [&str; 4],
        answer: u8,
        category: Category,
        difficulty: Difficulty,
    ) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
            choices: choices.map(String::from),
            answer,
            category,
            difficulty,
            explanation: String::new(),
        }
    }

    /// Set the explanation
    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = explanation.into();
        self
    }

    /// Check the answer index is in range
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("question id is empty".to_string());
        }
        if usize::from(self.answer) >= CHOICE_LABELS.len() {
            return Err(format!(
                "question {} has answer index {} (expected 0-3)",
                self.id, self.answer
            ));
        }
        Ok(())
    }
}
