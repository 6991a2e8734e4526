//! Gym AI Benchmark CLI

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::{ColoredString, Colorize};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use gym_bench::{
    analysis::BenchmarkResult,
    catalog::{recommended_by_tier, recommended_models, CatalogClient, Tier, FREE_MODELS, POPULAR_MODELS},
    config::{Config, Credentials},
    providers::{Backend, ClientFactory, HttpClientFactory, ModelConfig},
    questions::{load_questions, Category, Question},
    reporting::{format_report, ResultStore, ResultsCache},
    runner::{BatchProgress, ConsoleProgress, Evaluator, EvaluatorConfig, ModelOutcome, Orchestrator},
};

#[derive(Parser)]
#[command(name = "gym-bench")]
#[command(about = "AI Benchmark for Physical Education and Gym Training Knowledge")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run benchmark on a specific model
    Run {
        /// Model name (e.g., meta-llama/llama-3-8b-instruct:free)
        #[arg(short, long)]
        model: String,

        /// Specific category to test
        #[arg(short, long)]
        category: Option<Category>,

        /// Provider
        #[arg(short, long, default_value = "openrouter")]
        provider: Backend,

        /// Sampling temperature
        #[arg(short, long, default_value_t = 0.0)]
        temperature: f32,

        /// Force re-run even if results exist
        #[arg(short, long)]
        force: bool,
    },

    /// Compare multiple models
    Compare {
        /// Comma-separated model names
        #[arg(short, long, value_delimiter = ',', required = true)]
        models: Vec<String>,

        /// Specific category to test
        #[arg(short, long)]
        category: Option<Category>,

        /// Provider
        #[arg(short, long, default_value = "openrouter")]
        provider: Backend,
    },

    /// Run benchmark on all recommended models of a tier, in parallel batches
    BenchmarkAll {
        /// Tier: free, budget, or premium
        #[arg(short, long, default_value = "free")]
        tier: Tier,

        /// Limit number of models to test
        #[arg(short, long, default_value_t = 10)]
        limit: usize,

        /// Specific category to test
        #[arg(short, long)]
        category: Option<Category>,

        /// Models evaluated at once (default from config)
        #[arg(long)]
        concurrency: Option<usize>,
    },

    /// Show recommended models to benchmark, fetched from the catalog
    Recommend {
        /// Filter by tier: free, budget, premium
        #[arg(short, long)]
        tier: Option<Tier>,

        /// Show only untested models
        #[arg(short, long)]
        untested: bool,

        /// Limit number of results
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// Generate report from saved results
    Report {
        /// Specific result file
        #[arg(short, long)]
        file: Option<String>,

        /// List all available results
        #[arg(short, long)]
        list: bool,
    },

    /// List well-known free and paid models
    Models,

    /// Generate sample configuration
    InitConfig {
        /// Output path for configuration file
        #[arg(short, long, default_value = "gym-bench.toml")]
        output: PathBuf,
    },
}

/// Configuration and credentials resolved once at startup
struct App {
    config: Config,
    credentials: Credentials,
}

impl App {
    fn load(path: Option<PathBuf>) -> Result<Self, Box<dyn std::error::Error>> {
        let config = match path {
            Some(path) => Config::load(&path)?,
            None => Config::load_or_default(),
        };
        let credentials = Credentials::from_env(&config);
        Ok(Self { config, credentials })
    }

    fn factory(&self) -> HttpClientFactory {
        HttpClientFactory::from_config(&self.config, self.credentials.clone())
    }

    fn evaluator_config(&self) -> EvaluatorConfig {
        EvaluatorConfig {
            timeout_ms: self.config.benchmark.timeout_ms,
            question_parallelism: self.config.benchmark.question_parallelism,
        }
    }

    fn model_config(&self, backend: Backend, model: &str) -> ModelConfig {
        ModelConfig::new(backend, model)
            .with_temperature(self.config.benchmark.temperature)
            .with_max_tokens(self.config.benchmark.max_tokens)
    }

    fn store(&self) -> ResultStore {
        ResultStore::new(&self.config.paths.results_dir)
    }

    fn cache(&self) -> ResultsCache {
        ResultsCache::new(&self.config.paths.results_dir)
    }

    fn catalog(&self) -> CatalogClient {
        let key = self.credentials.api_key(Backend::OpenRouter).map(String::from);
        CatalogClient::new(&self.config.catalog, key)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("gym_bench=debug,info")
    } else {
        EnvFilter::new("gym_bench=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    println!("{}", "\n💪 Gym AI Benchmark\n".bold().cyan());

    match cli.command {
        Commands::InitConfig { output } => {
            init_config(output)?;
        }

        Commands::Models => {
            list_models();
        }

        command => {
            let app = App::load(cli.config)?;
            match command {
                Commands::Run {
                    model,
                    category,
                    provider,
                    temperature,
                    force,
                } => {
                    if let Err(e) = run_model(&app, &model, category, provider, temperature, force).await {
                        eprintln!("{} {}", "\n❌ Error:".red(), e);
                        std::process::exit(1);
                    }
                }

                Commands::Compare {
                    models,
                    category,
                    provider,
                } => {
                    compare_models(&app, models, category, provider).await?;
                }

                Commands::BenchmarkAll {
                    tier,
                    limit,
                    category,
                    concurrency,
                } => {
                    if let Err(e) = benchmark_all(&app, tier, limit, category, concurrency).await {
                        eprintln!("{} {}", "\n❌ Error:".red(), e);
                        std::process::exit(1);
                    }
                }

                Commands::Recommend { tier, untested, limit } => {
                    recommend(&app, tier, untested, limit).await?;
                }

                Commands::Report { file, list } => {
                    report(&app, file, list)?;
                }

                Commands::InitConfig { .. } | Commands::Models => {}
            }
        }
    }

    Ok(())
}

fn spinner(message: impl Into<String>) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

fn accuracy_color(accuracy: f64) -> ColoredString {
    let text = format!("{:.2}%", accuracy);
    if accuracy >= 80.0 {
        text.green()
    } else if accuracy >= 60.0 {
        text.yellow()
    } else {
        text.red()
    }
}

fn medal(rank: usize) -> String {
    match rank {
        0 => "🥇".to_string(),
        1 => "🥈".to_string(),
        2 => "🥉".to_string(),
        n => format!("{}.", n + 1),
    }
}

fn load_question_set(app: &App, category: Option<Category>) -> Result<Vec<Question>, Box<dyn std::error::Error>> {
    let pb = spinner("Loading questions...")?;
    match load_questions(&app.config.paths.questions_dir, category) {
        Ok(questions) if questions.is_empty() => {
            pb.abandon_with_message(format!("{} No questions found", "✖".red()));
            Err(format!("No questions found in {}", app.config.paths.questions_dir).into())
        }
        Ok(questions) => {
            pb.finish_with_message(format!("{} Loaded {} questions", "✔".green(), questions.len()));
            Ok(questions)
        }
        Err(e) => {
            pb.abandon_with_message(format!("{} Could not load questions", "✖".red()));
            Err(e.into())
        }
    }
}

async fn run_model(
    app: &App,
    model: &str,
    category: Option<Category>,
    provider: Backend,
    temperature: f32,
    force: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !force && category.is_none() {
        if let Some(existing) = app.cache().latest_for_model(model) {
            println!("{}", "⚠️  Results already exist for this model!".yellow());
            println!("{}", format!("   File: {}", existing.filename).dimmed());
            println!("{}", format!("   Accuracy: {:.2}%", existing.accuracy).dimmed());
            println!("{}", format!("   Date: {}", existing.timestamp.to_rfc2822()).dimmed());
            println!("{}", "\n💡 Use --force to re-run the benchmark".cyan());
            println!("{}", "   Or use 'gym-bench report -f <filename>' to view results\n".cyan());
            return Ok(());
        }
    }

    let questions = load_question_set(app, category)?;

    let client = app
        .factory()
        .create(&app.model_config(provider, model).with_temperature(temperature))?;

    println!("{}", "\n📊 Starting benchmark...".cyan());
    println!("{}", format!("Model: {}", model).dimmed());
    println!("{}", format!("Questions: {}", questions.len()).dimmed());
    println!(
        "{}",
        format!("Category: {}\n", category.map(|c| c.to_string()).unwrap_or_else(|| "all".to_string())).dimmed()
    );

    let evaluator = Evaluator::new(client, app.evaluator_config())
        .with_model_name(model)
        .with_progress(Arc::new(ConsoleProgress));
    let result = evaluator.evaluate(&questions).await?;
    let path = app.store().save_result(&result)?;

    println!("{}", "\n✅ Benchmark completed!".green());
    println!("{}", format!("\nResults saved to: {}", path.display()).cyan());
    print_summary(&result);
    Ok(())
}

fn print_summary(result: &BenchmarkResult) {
    println!("{}", "\nSummary:".yellow());
    println!("  Accuracy: {}%", format!("{:.2}", result.accuracy).bold());
    println!("  Correct: {}/{}", result.correct_answers, result.total_questions);
    println!("  Total Time: {:.2}s", result.total_time_ms as f64 / 1000.0);
    println!("  Avg Time: {:.2}s per question", result.average_time_ms / 1000.0);

    println!("{}", "\nAccuracy by Category:".yellow());
    for (category, accuracy) in &result.accuracy_by_category {
        println!("  {:<15}: {}", category.as_str(), accuracy_color(*accuracy));
    }

    println!("{}", "\nAccuracy by Difficulty:".yellow());
    for (difficulty, accuracy) in &result.accuracy_by_difficulty {
        println!("  {:<15}: {}", difficulty.as_str(), accuracy_color(*accuracy));
    }
}

async fn compare_models(
    app: &App,
    models: Vec<String>,
    category: Option<Category>,
    provider: Backend,
) -> Result<(), Box<dyn std::error::Error>> {
    let models: Vec<String> = models
        .into_iter()
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .collect();
    let questions = load_question_set(app, category)?;

    println!("{}", "\n📊 Comparing models...".cyan());
    println!("{}", format!("Models: {}", models.join(", ")).dimmed());
    println!("{}", format!("Questions: {}\n", questions.len()).dimmed());

    let factory = app.factory();
    let store = app.store();
    let mut results: Vec<BenchmarkResult> = Vec::new();

    for model in &models {
        println!("{}", format!("\n🔄 Testing {}...", model).blue());

        let outcome = match factory.create(&app.model_config(provider, model)) {
            Ok(client) => {
                Evaluator::new(client, app.evaluator_config())
                    .with_model_name(model.as_str())
                    .evaluate(&questions)
                    .await
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(result) => {
                println!("{} {}: {}", "✅".green(), model, accuracy_color(result.accuracy));
                if let Err(e) = store.save_result(&result) {
                    tracing::warn!("Could not save result for {}: {}", model, e);
                }
                results.push(result);
            }
            Err(e) => {
                println!("{}", format!("❌ {} failed: {}", model, e).red());
            }
        }
    }

    println!("{}", "\n\n📈 Comparison Results:".cyan());
    println!("{:=<100}", "");
    println!("{:<50}{:>12}{:>15}{:>12}", "Model", "Accuracy", "Avg Time", "Questions");
    println!("{:-<100}", "");

    let ranked = gym_bench::reporting::rank_by_accuracy(&results);
    for (i, result) in ranked.iter().enumerate() {
        let badge = if i < 3 { medal(i) } else { "  ".to_string() };
        println!(
            "{} {:<47}{:>12}{:>15}{:>12}",
            badge,
            result.model_name,
            accuracy_color(result.accuracy),
            format!("{:.2}s", result.average_time_ms / 1000.0),
            result.total_questions
        );
    }
    println!("{:=<100}", "");

    let path = store.save_comparison(models, results)?;
    println!("{}", format!("\n💾 Comparison saved to: {}", path.display()).cyan());
    Ok(())
}

/// Spinner per model; each result is priced and saved as soon as it arrives
struct SpinnerProgress {
    multi: MultiProgress,
    spinners: Mutex<HashMap<String, ProgressBar>>,
    store: ResultStore,
    style: ProgressStyle,
    /// Per-token (prompt, completion) prices from the catalog
    pricing: HashMap<String, (f64, f64)>,
}

impl BatchProgress for SpinnerProgress {
    fn on_batch_start(&self, batch: usize, total_batches: usize, models: &[String]) {
        let _ = self
            .multi
            .println(format!("Batch {}/{} ({} models)", batch, total_batches, models.len()).dimmed().to_string());
    }

    fn on_model_start(&self, model: &str) {
        let pb = self.multi.add(ProgressBar::new_spinner());
        pb.set_style(self.style.clone());
        pb.set_message(format!("Testing {}...", model));
        pb.enable_steady_tick(Duration::from_millis(100));
        if let Ok(mut spinners) = self.spinners.lock() {
            spinners.insert(model.to_string(), pb);
        }
    }

    fn on_model_complete(&self, outcome: &ModelOutcome) {
        let pb = self
            .spinners
            .lock()
            .ok()
            .and_then(|mut spinners| spinners.remove(&outcome.model));

        let message = match &outcome.result {
            Ok(result) => {
                let result = match self.pricing.get(&outcome.model) {
                    Some(&(prompt, completion)) => result.clone().with_estimated_cost(prompt, completion),
                    None => result.clone(),
                };
                if let Err(e) = self.store.save_result(&result) {
                    tracing::warn!("Could not save result for {}: {}", outcome.model, e);
                }
                format!(
                    "{} {}: {} ({}/{})",
                    "✔".green(),
                    outcome.model,
                    accuracy_color(result.accuracy),
                    result.correct_answers,
                    result.total_questions
                )
            }
            Err(e) => format!("{} {}: {} - {}", "✖".red(), outcome.model, "Error".red(), e),
        };

        match pb {
            Some(pb) => pb.finish_with_message(message),
            None => println!("{}", message),
        }
    }
}

async fn benchmark_all(
    app: &App,
    tier: Tier,
    limit: usize,
    category: Option<Category>,
    concurrency: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let pb = spinner("Fetching available models...")?;
    let catalog = app.catalog().fetch_available_models().await;
    let pricing: HashMap<String, (f64, f64)> = catalog
        .iter()
        .filter_map(|m| Some((m.id.clone(), (m.pricing.prompt_price()?, m.pricing.completion_price()?))))
        .collect();
    let mut selected: Vec<String> = if catalog.is_empty() && tier == Tier::Free {
        tracing::warn!("Catalog unavailable, falling back to the built-in free model list");
        FREE_MODELS.iter().map(|id| id.to_string()).collect()
    } else {
        recommended_by_tier(&catalog, tier)
            .into_iter()
            .map(|m| m.id().to_string())
            .collect()
    };
    selected.truncate(limit);
    pb.finish_with_message(format!("{} Found {} {} models to benchmark", "✔".green(), selected.len(), tier));

    if selected.is_empty() {
        println!("{}", "\nNo models to benchmark. Check your API key and connection.\n".yellow());
        return Ok(());
    }

    let concurrency = concurrency.unwrap_or(app.config.benchmark.concurrency);
    println!(
        "{}",
        format!("\n💪 Benchmarking {} {} models in parallel\n", selected.len(), tier).bold().cyan()
    );

    let questions = load_question_set(app, category)?;
    println!("{}", format!("Running with concurrency: {}\n", concurrency).cyan());

    let progress = Arc::new(SpinnerProgress {
        multi: MultiProgress::new(),
        spinners: Mutex::new(HashMap::new()),
        store: app.store(),
        style: ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?,
        pricing,
    });

    let models: Vec<ModelConfig> = selected
        .iter()
        .map(|id| app.model_config(Backend::OpenRouter, id))
        .collect();
    let total = models.len();

    let report = Orchestrator::new(Arc::new(app.factory()), questions, app.evaluator_config())
        .with_progress(progress)
        .run_batch(models, concurrency)
        .await;

    println!("{}", "\n📊 Summary:\n".bold().cyan());
    println!("{} {}/{}", "✓ Completed:".green(), report.completed().len(), total);
    println!("{} {}/{}", "✗ Failed:".red(), report.failed().len(), total);

    let top = report.top_performers(10);
    if !top.is_empty() {
        println!("{}", "\n🏆 Top Performers:\n".bold().cyan());
        for (i, result) in top.iter().enumerate() {
            println!(
                "{} {}: {} ({}/{})",
                medal(i),
                result.model_name.bold(),
                accuracy_color(result.accuracy),
                result.correct_answers,
                result.total_questions
            );
        }
    }

    println!("{}", format!("\nResults saved to: {}\n", app.store().dir().display()).dimmed());
    Ok(())
}

async fn recommend(
    app: &App,
    tier: Option<Tier>,
    untested_only: bool,
    limit: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let pb = spinner("Fetching available models from catalog...")?;
    let catalog = app.catalog().fetch_available_models().await;

    if catalog.is_empty() {
        pb.abandon_with_message(format!("{} Could not fetch models from catalog", "✖".red()));
        println!("{}", "\n❌ Please check your API key and connection\n".red());
        return Ok(());
    }
    pb.finish_with_message(format!("{} Analyzed {} models", "✔".green(), catalog.len()));
    println!("{}", "\n💪 Gym AI Benchmark - Recommended Models\n".bold().cyan());

    let mut models = match tier {
        Some(tier) => recommended_by_tier(&catalog, tier),
        None => recommended_models(&catalog),
    };

    let cache = app.cache();
    let tested: HashSet<String> = cache.tested_models().into_iter().collect();

    if untested_only {
        models.retain(|m| !tested.contains(m.id()));
        if models.is_empty() {
            println!("{}", "✅ All recommended models have been tested!\n".green());
            return Ok(());
        }
        println!("{}", format!("📋 {} untested recommended models:\n", models.len()).yellow());
    } else {
        println!(
            "{}",
            format!(
                "Showing top {} recommended models (from {} available)\n",
                models.len().min(limit),
                catalog.len()
            )
            .dimmed()
        );
    }

    models.truncate(limit);

    for tier in Tier::all() {
        let tier_models: Vec<_> = models.iter().filter(|m| m.tier == tier).collect();
        if tier_models.is_empty() {
            continue;
        }

        let (icon, label) = match tier {
            Tier::Free => ("🆓", "Free"),
            Tier::Budget => ("💰", "Budget"),
            Tier::Premium => ("💎", "Premium"),
        };
        println!("{}", format!("{} {} Tier ({} models):\n", icon, label, tier_models.len()).cyan());

        for model in tier_models {
            let is_tested = tested.contains(model.id());
            let status = if is_tested { "✓".green() } else { "○".dimmed() };
            let display_name = model.model.name.as_deref().unwrap_or(model.id());

            println!("{} {}", status, display_name.bold());
            println!("   {} {}", "ID:".dimmed(), model.id());
            println!("   {} {}", "Provider:".dimmed(), model.provider());
            println!("   {} {} per benchmark", "Cost:".dimmed(), model.estimated_cost);
            match model.model.context_length {
                Some(context) => println!("   {} {} tokens", "Context:".dimmed(), context),
                None => println!("   {} unknown", "Context:".dimmed()),
            }

            if is_tested {
                if let Some(result) = cache.latest_for_model(model.id()) {
                    println!("{}", format!("   ✓ Tested: {:.2}% accuracy", result.accuracy).green());
                }
            }
            println!();
        }
    }

    let shown_tested = models.iter().filter(|m| tested.contains(m.id())).count();
    let shown_untested = models.len() - shown_tested;

    println!("{}", "📊 Summary:".cyan());
    println!("   {} {}/{} shown", "Tested:".green(), shown_tested, models.len());
    println!("   {} {}/{} shown", "Untested:".yellow(), shown_untested, models.len());
    println!("   {} {} models", "Total available:".dimmed(), catalog.len());

    let ids: Vec<&str> = models.iter().map(|m| m.id()).collect();
    if let Some(next) = cache.untested(ids).first() {
        println!("{}", "\n💡 Suggested next test:".cyan());
        println!("{}", format!("   gym-bench run -m {}", next).bold());
    }

    println!("{}", "\n💡 Tips:".dimmed());
    println!("{}", "   • Start with free models: --tier free --untested".dimmed());
    println!("{}", "   • View only untested: --untested".dimmed());
    println!("{}", "   • Increase limit: --limit 50".dimmed());
    println!("{}", "   • The run command skips tested models automatically\n".dimmed());
    Ok(())
}

fn report(app: &App, file: Option<String>, list: bool) -> Result<(), Box<dyn std::error::Error>> {
    let store = app.store();

    if list {
        let files = store.list()?;
        if files.is_empty() {
            println!("{}", "No results found. Run a benchmark first!".yellow());
            return Ok(());
        }

        println!("{}", "\n📁 Available Results:\n".cyan());
        for file in files {
            println!("  • {}", file);
        }
        println!();
        return Ok(());
    }

    let Some(file) = file else {
        println!("{}", "Please specify a file with -f or use -l to list available files".red());
        return Ok(());
    };

    match store.load(&file) {
        Ok(report) => {
            println!("{}", format_report(&report));
            Ok(())
        }
        Err(gym_bench::reporting::StoreError::NotFound(name)) => {
            println!("{}", format!("File not found: {}", name).red());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn list_models() {
    println!("{}", "\n🆓 Free Models (no credits required):\n".cyan());
    for model in FREE_MODELS {
        println!("  • {}", model.green());
    }

    println!("{}", "\n💳 Popular Paid Models:\n".cyan());
    for model in POPULAR_MODELS {
        println!("  • {}", model.yellow());
    }
    println!();
}

fn init_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();

    // Ensure parent directory exists
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }

    config.save_toml(&output)?;
    println!("Configuration written to: {}", output.display());
    Ok(())
}
