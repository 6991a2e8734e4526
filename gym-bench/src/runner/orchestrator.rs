//! Multi-model batch scheduler

use std::cmp::Ordering;
use std::sync::Arc;

use crate::analysis::BenchmarkResult;
use crate::providers::{ClientFactory, ModelConfig};
use crate::questions::Question;

use super::evaluator::{Evaluator, EvaluatorConfig};

/// Result or error for one model in a sweep
#[derive(Debug, Clone)]
pub struct ModelOutcome {
    pub model: String,
    pub result: Result<BenchmarkResult, String>,
}

impl ModelOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Ordered outcomes of a multi-model sweep
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub outcomes: Vec<ModelOutcome>,
    /// Number of batches executed
    pub batches: usize,
}

impl BatchReport {
    /// Successful results in sweep order
    pub fn completed(&self) -> Vec<&BenchmarkResult> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok()).collect()
    }

    /// Failed models and their errors
    pub fn failed(&self) -> Vec<(&str, &str)> {
        self.outcomes
            .iter()
            .filter_map(|o| match &o.result {
                Err(e) => Some((o.model.as_str(), e.as_str())),
                Ok(_) => None,
            })
            .collect()
    }

    /// Best results by accuracy; ties keep sweep order
    pub fn top_performers(&self, limit: usize) -> Vec<&BenchmarkResult> {
        let mut ranked = self.completed();
        ranked.sort_by(|a, b| b.accuracy.partial_cmp(&a.accuracy).unwrap_or(Ordering::Equal));
        ranked.truncate(limit);
        ranked
    }
}

/// Observer for sweep progress
pub trait BatchProgress: Send + Sync {
    fn on_batch_start(&self, batch: usize, total_batches: usize, models: &[String]);
    fn on_model_start(&self, model: &str);
    fn on_model_complete(&self, outcome: &ModelOutcome);
}

/// Default no-op batch observer
pub struct NoOpBatchProgress;

impl BatchProgress for NoOpBatchProgress {
    fn on_batch_start(&self, _batch: usize, _total_batches: usize, _models: &[String]) {}
    fn on_model_start(&self, _model: &str) {}
    fn on_model_complete(&self, _outcome: &ModelOutcome) {}
}

/// Runs the evaluator for many models, a bounded batch at a time
pub struct Orchestrator {
    factory: Arc<dyn ClientFactory>,
    questions: Arc<Vec<Question>>,
    config: EvaluatorConfig,
    progress: Arc<dyn BatchProgress>,
}

impl Orchestrator {
    pub fn new(factory: Arc<dyn ClientFactory>, questions: Vec<Question>, config: EvaluatorConfig) -> Self {
        Self {
            factory,
            questions: Arc::new(questions),
            config,
            progress: Arc::new(NoOpBatchProgress),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn BatchProgress>) -> Self {
        self.progress = progress;
        self
    }

    /// Evaluate every model in consecutive batches of at most `concurrency`.
    ///
    /// Models within a batch run concurrently and the whole batch is awaited
    /// before the next starts. Per-model failures, including client
    /// construction errors, become error outcomes.
    pub async fn run_batch(&self, models: Vec<ModelConfig>, concurrency: usize) -> BatchReport {
        let width = concurrency.max(1);
        let total_batches = models.len().div_ceil(width);
        let mut report = BatchReport::default();

        tracing::info!(
            "Benchmarking {} models in {} batches of up to {}",
            models.len(),
            total_batches,
            width
        );

        for (index, batch) in models.chunks(width).enumerate() {
            let names: Vec<String> = batch.iter().map(|m| m.model_name.clone()).collect();
            self.progress.on_batch_start(index + 1, total_batches, &names);

            let mut handles = Vec::with_capacity(batch.len());
            for model in batch {
                self.progress.on_model_start(&model.model_name);
                let handle = match self.factory.create(model) {
                    Ok(client) => {
                        let evaluator = Evaluator::new(client, self.config.clone())
                            .with_model_name(model.model_name.clone());
                        let questions = self.questions.clone();
                        Ok(tokio::spawn(async move { evaluator.evaluate(&questions).await }))
                    }
                    Err(e) => {
                        tracing::error!("Could not create client for {}: {}", model.model_name, e);
                        Err(e.to_string())
                    }
                };
                handles.push((model.model_name.clone(), handle));
            }

            for (model, handle) in handles {
                let result = match handle {
                    Err(e) => Err(e),
                    Ok(handle) => match handle.await {
                        Ok(Ok(result)) => Ok(result),
                        Ok(Err(e)) => {
                            tracing::error!("Benchmark failed for {}: {}", model, e);
                            Err(e.to_string())
                        }
                        Err(e) => {
                            tracing::error!("Benchmark task for {} panicked: {}", model, e);
                            Err(format!("Task failed: {}", e))
                        }
                    },
                };
                self.record(&mut report, &model, result);
            }

            report.batches += 1;
        }

        tracing::info!(
            "Sweep finished: {} completed, {} failed",
            report.completed().len(),
            report.failed().len()
        );
        report
    }

    fn record(&self, report: &mut BatchReport, model: &str, result: Result<BenchmarkResult, String>) {
        let outcome = ModelOutcome {
            model: model.to_string(),
            result,
        };
        self.progress.on_model_complete(&outcome);
        report.outcomes.push(outcome);
    }
}
