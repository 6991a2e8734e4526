//! Grading of a parsed answer against a question's ground truth

use crate::questions::{Question, CHOICE_LABELS};

/// Letter for a zero-based choice index, `None` when out of range
pub fn correct_letter(answer: u8) -> Option<char> {
    CHOICE_LABELS.get(answer as usize).copied()
}

/// Compare a parsed answer to the question's correct choice.
///
/// The parser already normalizes to uppercase, so this is plain equality.
pub fn grade(question: &Question, parsed: &str) -> bool {
    let mut chars = parsed.chars();
    match (correct_letter(question.answer), chars.next(), chars.next()) {
        (Some(expected), Some(given), None) => expected == given,
        _ => false,
    }
}
