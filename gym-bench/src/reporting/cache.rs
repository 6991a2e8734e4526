//! Index of already-tested models, rebuilt from the results directory
//!
//! Every query rescans and reparses the directory. That is linear in the
//! number of stored files, which is fine for a few hundred runs.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Summary of one stored single-model result
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResult {
    pub model_name: String,
    pub filename: String,
    pub timestamp: DateTime<Utc>,
    pub accuracy: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultHeader {
    model_name: String,
    timestamp: DateTime<Utc>,
    accuracy: f64,
}

/// Read-only view over a results directory
#[derive(Debug, Clone)]
pub struct ResultsCache {
    dir: PathBuf,
}

impl ResultsCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// All readable results; unreadable or foreign files are skipped
    pub fn list(&self) -> Vec<CachedResult> {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.ends_with(".json"))
            .collect();
        names.sort();

        names
            .into_iter()
            .filter_map(|filename| {
                let content = fs::read_to_string(self.dir.join(&filename)).ok()?;
                match serde_json::from_str::<ResultHeader>(&content) {
                    Ok(header) => Some(CachedResult {
                        model_name: header.model_name,
                        filename,
                        timestamp: header.timestamp,
                        accuracy: header.accuracy,
                    }),
                    Err(e) => {
                        tracing::debug!("Skipping {} in results cache: {}", filename, e);
                        None
                    }
                }
            })
            .collect()
    }

    pub fn has_result_for_model(&self, model: &str) -> bool {
        self.list().iter().any(|r| r.model_name == model)
    }

    /// Most recent result for a model
    pub fn latest_for_model(&self, model: &str) -> Option<CachedResult> {
        self.list()
            .into_iter()
            .filter(|r| r.model_name == model)
            .max_by_key(|r| r.timestamp)
    }

    /// Distinct tested model names, first-seen order
    pub fn tested_models(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.list()
            .into_iter()
            .filter(|r| seen.insert(r.model_name.clone()))
            .map(|r| r.model_name)
            .collect()
    }

    /// Ids from `recommended` that have no stored result
    pub fn untested<'a>(&self, recommended: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let tested: HashSet<String> = self.tested_models().into_iter().collect();
        recommended
            .into_iter()
            .filter(|id| !tested.contains(*id))
            .map(String::from)
            .collect()
    }
}
