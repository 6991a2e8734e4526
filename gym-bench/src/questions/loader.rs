//! Question loading from per-category JSON files

use std::path::Path;

use super::{Category, Question};

/// Error type for question loading
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid question: {0}")]
    Invalid(String),
}

/// Load questions from a JSON string containing an array of questions
pub fn load_questions_from_str(content: &str) -> Result<Vec<Question>, LoadError> {
    let questions: Vec<Question> = serde_json::from_str(content)
        .map_err(|e| LoadError::Parse(format!("JSON parse error: {}", e)))?;

    for question in &questions {
        question.validate().map_err(LoadError::Invalid)?;
    }

    Ok(questions)
}

/// Load questions from a single JSON file
pub fn load_questions_from_file(path: impl AsRef<Path>) -> Result<Vec<Question>, LoadError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;

    load_questions_from_str(&content).map_err(|e| match e {
        LoadError::Parse(msg) => LoadError::Parse(format!("{}: {}", path.display(), msg)),
        other => other,
    })
}

/// Load questions from the question bank directory.
///
/// With a category, reads `{dir}/{category}.json` and fails if it is missing.
/// Without one, concatenates every category file that exists, in category
/// order; absent files are skipped.
pub fn load_questions(
    dir: impl AsRef<Path>,
    category: Option<Category>,
) -> Result<Vec<Question>, LoadError> {
    let dir = dir.as_ref();

    if let Some(category) = category {
        return load_questions_from_file(dir.join(format!("{}.json", category)));
    }

    let mut all_questions = Vec::new();

    for category in Category::all() {
        let path = dir.join(format!("{}.json", category));
        if !path.exists() {
            tracing::debug!("No question file for {} at {}", category, path.display());
            continue;
        }
        all_questions.extend(load_questions_from_file(&path)?);
    }

    Ok(all_questions)
}
