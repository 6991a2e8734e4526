//! CLI integration tests for the gym-bench binary.
//!
//! Only commands that never touch the network are exercised here.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use gym_bench::analysis::BenchmarkResult;
use gym_bench::config::Config;
use gym_bench::reporting::ResultStore;

// =============================================================================
// Helper Functions
// =============================================================================

fn gym_bench_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_gym-bench"))
}

fn run_in(dir: &Path, args: &[&str]) -> Output {
    Command::new(gym_bench_bin())
        .current_dir(dir)
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("OPENROUTER_API_KEY")
        .output()
        .expect("Failed to execute gym-bench binary")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "Expected exit code 0, got {:?}\nstderr: {}",
        output.status.code(),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn write_config(dir: &Path) -> PathBuf {
    let path = dir.join("bench.toml");
    std::fs::write(
        &path,
        "[paths]\nquestions_dir = \"questions\"\nresults_dir = \"out\"\n",
    )
    .unwrap();
    path
}

// =============================================================================
// Commands
// =============================================================================

#[test]
fn test_help_lists_subcommands() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_in(dir.path(), &["--help"]);
    assert_success(&output);

    let text = stdout(&output);
    for command in ["run", "compare", "benchmark-all", "recommend", "report", "models", "init-config"] {
        assert!(text.contains(command), "missing {} in help:\n{}", command, text);
    }
}

#[test]
fn test_init_config_writes_loadable_toml() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_in(dir.path(), &["init-config", "-o", "nested/gym.toml"]);
    assert_success(&output);

    let path = dir.path().join("nested").join("gym.toml");
    assert!(path.exists());

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.benchmark.max_tokens, 10);
    assert_eq!(config.paths.questions_dir, "data/questions");
}

#[test]
fn test_models_lists_free_models() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_in(dir.path(), &["models"]);
    assert_success(&output);
    assert!(stdout(&output).contains(":free"));
}

#[test]
fn test_report_list_and_render() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());
    let config = config.to_str().unwrap();

    let output = run_in(dir.path(), &["--config", config, "report", "--list"]);
    assert_success(&output);
    assert!(stdout(&output).contains("No results found"));

    let result = BenchmarkResult::from_results("acme/gym-coach", Vec::new(), 0);
    let saved = ResultStore::new(dir.path().join("out")).save_result(&result).unwrap();
    let filename = saved.file_name().unwrap().to_str().unwrap();

    let output = run_in(dir.path(), &["--config", config, "report", "-l"]);
    assert_success(&output);
    assert!(stdout(&output).contains(filename));

    let output = run_in(dir.path(), &["--config", config, "report", "-f", filename]);
    assert_success(&output);
    assert!(stdout(&output).contains("Benchmark Results: acme/gym-coach"));
}

#[test]
fn test_run_skips_cached_model() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());
    let config = config.to_str().unwrap();

    let result = BenchmarkResult::from_results("acme/gym-coach", Vec::new(), 0);
    ResultStore::new(dir.path().join("out")).save_result(&result).unwrap();

    let output = run_in(dir.path(), &["--config", config, "run", "-m", "acme/gym-coach"]);
    assert_success(&output);
    assert!(stdout(&output).contains("Results already exist"));
}

#[test]
fn test_run_without_questions_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());

    let output = run_in(
        dir.path(),
        &["--config", config.to_str().unwrap(), "run", "-m", "acme/new-model", "-c", "anatomy"],
    );
    assert!(!output.status.success());
}

#[test]
fn test_run_with_empty_bank_saves_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());
    let config = config.to_str().unwrap();

    for _ in 0..2 {
        let output = run_in(dir.path(), &["--config", config, "run", "-m", "llama3", "-p", "ollama"]);
        assert!(!output.status.success());
        assert!(!stdout(&output).contains("Results already exist"));
        assert!(String::from_utf8_lossy(&output.stderr).contains("No questions found"));
    }
    assert!(!dir.path().join("out").exists());
}

#[test]
fn test_config_paths_follow_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let project = dir.path().join("project");
    std::fs::create_dir_all(&project).unwrap();
    let config = write_config(&project);

    let result = BenchmarkResult::from_results("acme/gym-coach", Vec::new(), 0);
    let saved = ResultStore::new(project.join("out")).save_result(&result).unwrap();
    let filename = saved.file_name().unwrap().to_str().unwrap();

    // Run from the parent; "out" still resolves next to the config file
    let output = run_in(dir.path(), &["--config", "project/bench.toml", "report", "-l"]);
    assert_success(&output);
    assert!(stdout(&output).contains(filename));
    assert!(config.exists());
}

#[test]
fn test_unknown_category_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_in(dir.path(), &["run", "-m", "x", "-c", "yoga"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown category"));
}
