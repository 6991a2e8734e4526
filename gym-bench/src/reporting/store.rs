//! Flat directory of JSON reports, one file per run

use chrono::{DateTime, SecondsFormat, Utc};
use std::fs;
use std::path::{Path, PathBuf};

use super::Report;
use crate::analysis::BenchmarkResult;

/// Result store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid report {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Report not found: {0}")]
    NotFound(String),
}

fn file_timestamp(when: DateTime<Utc>) -> String {
    when.to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
}

/// `{model}_{timestamp}.json` with `/` in the model name replaced by `_`
pub fn result_filename(model: &str, when: DateTime<Utc>) -> String {
    format!("{}_{}.json", model.replace('/', "_"), file_timestamp(when))
}

pub fn comparison_filename(when: DateTime<Utc>) -> String {
    format!("comparison_{}.json", file_timestamp(when))
}

/// Writes and reads reports in a results directory
#[derive(Debug, Clone)]
pub struct ResultStore {
    dir: PathBuf,
}

impl ResultStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write a report as pretty JSON, creating the directory if needed
    pub fn save(&self, report: &Report, filename: &str) -> Result<PathBuf, StoreError> {
        fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.dir.join(filename);
        let json = serde_json::to_string_pretty(report).map_err(|e| StoreError::Parse {
            path: path.clone(),
            message: e.to_string(),
        })?;
        fs::write(&path, json).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;

        tracing::debug!("Saved report to {}", path.display());
        Ok(path)
    }

    /// Save one model's result under its generated filename
    pub fn save_result(&self, result: &BenchmarkResult) -> Result<PathBuf, StoreError> {
        let filename = result_filename(&result.model_name, result.timestamp);
        self.save(&Report::Single(result.clone()), &filename)
    }

    /// Save a comparison of several results
    pub fn save_comparison(
        &self,
        models: Vec<String>,
        results: Vec<BenchmarkResult>,
    ) -> Result<PathBuf, StoreError> {
        let filename = comparison_filename(Utc::now());
        self.save(&Report::comparison(models, results), &filename)
    }

    pub fn load(&self, filename: &str) -> Result<Report, StoreError> {
        let path = self.dir.join(filename);
        if !path.is_file() {
            return Err(StoreError::NotFound(filename.to_string()));
        }

        let content = fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|e| StoreError::Parse {
            path,
            message: e.to_string(),
        })
    }

    /// Sorted `*.json` file names; empty when the directory does not exist
    pub fn list(&self) -> Result<Vec<String>, StoreError> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.ends_with(".json"))
            .collect();
        names.sort();
        Ok(names)
    }
}
