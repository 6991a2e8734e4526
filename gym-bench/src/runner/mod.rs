//! Benchmark execution engine

pub mod evaluator;
pub mod orchestrator;
pub mod rate_limiter;

pub use evaluator::{
    render_prompt, ConsoleProgress, Evaluator, EvaluatorConfig, NoOpProgress, ProgressCallback,
    PROMPT_TEMPLATE,
};
pub use orchestrator::{
    BatchProgress, BatchReport, ModelOutcome, NoOpBatchProgress, Orchestrator,
};
pub use rate_limiter::RateLimiter;
