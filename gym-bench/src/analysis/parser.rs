//! Answer extraction from free-form model output

use crate::questions::CHOICE_LABELS;

/// Turn a raw completion into a single answer label.
///
/// Never fails. Output that names no label degrades to its first character
/// (or an empty string), which is simply graded incorrect.
pub fn parse_answer(raw: &str) -> String {
    let cleaned = raw.trim().to_uppercase();

    let mut chars = cleaned.chars();
    if let (Some(only), None) = (chars.next(), chars.next()) {
        if CHOICE_LABELS.contains(&only) {
            return only.to_string();
        }
    }

    if let Some(label) = cleaned.chars().find(|c| CHOICE_LABELS.contains(c)) {
        return label.to_string();
    }

    cleaned.chars().next().map(String::from).unwrap_or_default()
}
