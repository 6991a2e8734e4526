//! Evaluation engine: drives one model through a question set

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;

use crate::analysis::{correct_letter, grade, parse_answer, BenchmarkResult, EvaluationResult};
use crate::providers::{LLMProvider, ProviderError, ProviderResult};
use crate::questions::Question;

/// The single prompt template every question is rendered into
pub const PROMPT_TEMPLATE: &str = "You are taking a physical education and gym training exam.
Answer the multiple choice question by selecting only the letter (A, B, C, or D) of the correct answer.

Question: {question}
A) {choice_a}
B) {choice_b}
C) {choice_c}
D) {choice_d}

Answer with only the letter:";

/// Render a question into the prompt template
pub fn render_prompt(question: &Question) -> String {
    PROMPT_TEMPLATE
        .replacen("{question}", &question.question, 1)
        .replacen("{choice_a}", &question.choices[0], 1)
        .replacen("{choice_b}", &question.choices[1], 1)
        .replacen("{choice_c}", &question.choices[2], 1)
        .replacen("{choice_d}", &question.choices[3], 1)
}

/// Configuration for the evaluator
#[derive(Debug, Clone)]
pub struct EvaluatorConfig {
    /// Per-call completion timeout in milliseconds
    pub timeout_ms: u64,
    /// Questions in flight at once; 1 is strictly sequential
    pub question_parallelism: usize,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 60_000,
            question_parallelism: 1,
        }
    }
}

/// Observer for per-question progress
pub trait ProgressCallback: Send + Sync {
    fn on_question_complete(&self, completed: usize, total: usize, result: &EvaluationResult);
}

/// Default no-op progress callback
pub struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_question_complete(&self, _completed: usize, _total: usize, _result: &EvaluationResult) {}
}

/// Console progress callback
pub struct ConsoleProgress;

impl ProgressCallback for ConsoleProgress {
    fn on_question_complete(&self, completed: usize, total: usize, result: &EvaluationResult) {
        let mark = if result.is_correct { "✓" } else { "✗" };
        println!("[{}/{}] {} {}", completed, total, mark, result.question_id);
    }
}

/// Runs a question set against one completion client
#[derive(Clone)]
pub struct Evaluator {
    provider: Arc<dyn LLMProvider>,
    model_name: String,
    config: EvaluatorConfig,
    progress: Arc<dyn ProgressCallback>,
}

impl Evaluator {
    /// Create an evaluator reporting under the client's model name
    pub fn new(provider: Arc<dyn LLMProvider>, config: EvaluatorConfig) -> Self {
        let model_name = provider.model().to_string();
        Self {
            provider,
            model_name,
            config,
            progress: Arc::new(NoOpProgress),
        }
    }

    /// Override the name recorded in the result
    pub fn with_model_name(mut self, name: impl Into<String>) -> Self {
        self.model_name = name.into();
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Ask one question and grade the reply.
    ///
    /// Completion failures propagate; an unparseable reply is just wrong.
    pub async fn evaluate_question(&self, question: &Question) -> ProviderResult<EvaluationResult> {
        let prompt = render_prompt(question);
        let timeout = Duration::from_millis(self.config.timeout_ms);

        // Rate-limit waits are not part of the call's time or timeout
        self.provider.ready().await;
        let start = Instant::now();

        let outcome = tokio::time::timeout(timeout, self.provider.complete(&prompt)).await;
        let time_ms = start.elapsed().as_millis() as u64;

        let response = match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                tracing::error!(
                    "Error evaluating question {} on {} after {}ms: {}",
                    question.id,
                    self.model_name,
                    time_ms,
                    e
                );
                return Err(e);
            }
            Err(_) => {
                tracing::error!(
                    "Question {} on {} timed out after {}ms",
                    question.id,
                    self.model_name,
                    self.config.timeout_ms
                );
                return Err(ProviderError::Timeout {
                    timeout_ms: self.config.timeout_ms,
                });
            }
        };

        let model_answer = parse_answer(&response.content);
        let is_correct = grade(question, &model_answer);
        tracing::debug!(
            "{} {}: raw={:?} parsed={} correct={}",
            self.model_name,
            question.id,
            response.content,
            model_answer,
            is_correct
        );

        Ok(EvaluationResult {
            question_id: question.id.clone(),
            question: question.question.clone(),
            model_answer,
            correct_answer: correct_letter(question.answer)
                .map(String::from)
                .unwrap_or_default(),
            is_correct,
            category: question.category,
            difficulty: question.difficulty,
            time_ms,
            tokens: response.usage,
        })
    }

    /// Run every question and aggregate the score.
    ///
    /// Results keep input order. The first failing question aborts the run
    /// and no partial result is returned.
    pub async fn evaluate(&self, questions: &[Question]) -> ProviderResult<BenchmarkResult> {
        tracing::info!(
            "Evaluating {} on {} questions",
            self.model_name,
            questions.len()
        );
        let start = Instant::now();

        let results = if self.config.question_parallelism > 1 {
            self.evaluate_parallel(questions).await?
        } else {
            self.evaluate_sequential(questions).await?
        };

        let total_time_ms = start.elapsed().as_millis() as u64;
        let result = BenchmarkResult::from_results(self.model_name.clone(), results, total_time_ms);

        tracing::info!(
            "{} finished: {}/{} correct ({:.2}%) in {}ms",
            result.model_name,
            result.correct_answers,
            result.total_questions,
            result.accuracy,
            result.total_time_ms
        );
        Ok(result)
    }

    async fn evaluate_sequential(&self, questions: &[Question]) -> ProviderResult<Vec<EvaluationResult>> {
        let mut results = Vec::with_capacity(questions.len());

        for question in questions {
            let result = self.evaluate_question(question).await?;
            self.progress
                .on_question_complete(results.len() + 1, questions.len(), &result);
            results.push(result);
        }

        Ok(results)
    }

    /// Keep up to `question_parallelism` calls in flight, then restore input order
    async fn evaluate_parallel(&self, questions: &[Question]) -> ProviderResult<Vec<EvaluationResult>> {
        let total = questions.len();
        let mut slots: Vec<Option<EvaluationResult>> = vec![None; total];
        let mut pending = questions.iter().cloned().enumerate();
        let mut in_flight = JoinSet::new();
        let mut completed = 0;

        loop {
            while in_flight.len() < self.config.question_parallelism {
                let Some((index, question)) = pending.next() else {
                    break;
                };
                let evaluator = self.clone();
                in_flight.spawn(async move { (index, evaluator.evaluate_question(&question).await) });
            }

            let Some(joined) = in_flight.join_next().await else {
                break;
            };

            match joined {
                Ok((index, Ok(result))) => {
                    completed += 1;
                    self.progress.on_question_complete(completed, total, &result);
                    slots[index] = Some(result);
                }
                Ok((_, Err(e))) => {
                    in_flight.abort_all();
                    return Err(e);
                }
                Err(e) => {
                    in_flight.abort_all();
                    return Err(ProviderError::Parse(format!("Question task failed: {}", e)));
                }
            }
        }

        Ok(slots.into_iter().flatten().collect())
    }
}
