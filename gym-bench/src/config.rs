//! Configuration management for the gym benchmark
//!
//! Loads backend, benchmark, path and catalog settings from TOML files and
//! resolves process-wide credentials once, at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::providers::Backend;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Backend settings keyed by backend name ("openrouter", "ollama", ...)
    #[serde(default = "default_providers")]
    pub providers: HashMap<String, ProviderSettings>,
    #[serde(default)]
    pub benchmark: BenchmarkSettings,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub catalog: CatalogSettings,
}

/// Backend-specific settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Environment variable holding the API key; empty when none is needed
    #[serde(default)]
    pub api_key_env: String,
    pub base_url: String,
    /// Environment variable that overrides `base_url`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url_env: Option<String>,
    /// Requests per minute, 0 for unlimited
    #[serde(default)]
    pub rpm: u32,
}

/// Benchmark execution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkSettings {
    /// Models evaluated at once by `benchmark-all`
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// In-flight questions per model; 1 keeps evaluation sequential
    #[serde(default = "default_question_parallelism")]
    pub question_parallelism: usize,
    /// Per-call completion timeout
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

/// Filesystem locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_questions_dir")]
    pub questions_dir: String,
    #[serde(default = "default_results_dir")]
    pub results_dir: String,
}

/// Model catalog endpoint and the identity sent to the gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSettings {
    #[serde(default = "default_catalog_url")]
    pub url: String,
    #[serde(default = "default_referer")]
    pub referer: String,
    #[serde(default = "default_title")]
    pub title: String,
}

// Default value functions
fn default_concurrency() -> usize { 5 }
fn default_question_parallelism() -> usize { 1 }
fn default_timeout_ms() -> u64 { 60_000 }
fn default_max_tokens() -> u32 { crate::providers::DEFAULT_MAX_TOKENS }
fn default_questions_dir() -> String { "data/questions".to_string() }
fn default_results_dir() -> String { "results".to_string() }
fn default_catalog_url() -> String { "https://openrouter.ai/api/v1/models".to_string() }
fn default_referer() -> String { "https://github.com/guhcostan/gym-ai-benchmark".to_string() }
fn default_title() -> String { "Gym AI Benchmark".to_string() }

fn default_providers() -> HashMap<String, ProviderSettings> {
    Backend::all()
        .into_iter()
        .map(|backend| (backend.as_str().to_string(), ProviderSettings::for_backend(backend)))
        .collect()
}

impl Default for BenchmarkSettings {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            question_parallelism: default_question_parallelism(),
            timeout_ms: default_timeout_ms(),
            temperature: 0.0,
            max_tokens: default_max_tokens(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            questions_dir: default_questions_dir(),
            results_dir: default_results_dir(),
        }
    }
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            url: default_catalog_url(),
            referer: default_referer(),
            title: default_title(),
        }
    }
}

impl PathsConfig {
    /// Relative paths joined onto `base`; absolute paths are kept
    pub fn relative_to(&self, base: &Path) -> Self {
        let resolve = |dir: &str| {
            if Path::new(dir).is_relative() {
                base.join(dir).display().to_string()
            } else {
                dir.to_string()
            }
        };

        Self {
            questions_dir: resolve(&self.questions_dir),
            results_dir: resolve(&self.results_dir),
        }
    }
}

impl ProviderSettings {
    /// Built-in settings for a backend
    pub fn for_backend(backend: Backend) -> Self {
        Self {
            api_key_env: backend.api_key_env().unwrap_or_default().to_string(),
            base_url: backend.default_base_url().to_string(),
            base_url_env: match backend {
                Backend::Ollama => Some("OLLAMA_BASE_URL".to_string()),
                _ => None,
            },
            rpm: 0,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(content)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;

        for key in config.providers.keys() {
            key.parse::<Backend>().map_err(ConfigError::Parse)?;
        }

        // Backends missing from the file keep their built-in settings
        for backend in Backend::all() {
            config
                .providers
                .entry(backend.as_str().to_string())
                .or_insert_with(|| ProviderSettings::for_backend(backend));
        }

        Ok(config)
    }

    /// Load a config file, resolving relative `[paths]` against its directory
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = Self::from_file(path)?;
        if let Some(base) = path.parent() {
            config.paths = config.paths.relative_to(base);
        }
        Ok(config)
    }

    /// Load from default config location or return defaults
    pub fn load_or_default() -> Self {
        let config_paths = ["gym-bench.toml", "gym-bench/gym-bench.toml"];

        for path in &config_paths {
            if let Ok(config) = Self::load(path) {
                tracing::info!("Loaded configuration from {}", path);
                return config;
            }
        }

        tracing::info!("Using default configuration");
        Self::default()
    }

    /// Save configuration to a TOML file
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        fs::write(path, content)
            .map_err(|e| ConfigError::Io(e.to_string()))?;
        Ok(())
    }

    /// Get the settings for a backend
    pub fn provider(&self, backend: Backend) -> ProviderSettings {
        self.providers
            .get(backend.as_str())
            .cloned()
            .unwrap_or_else(|| ProviderSettings::for_backend(backend))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            providers: default_providers(),
            benchmark: BenchmarkSettings::default(),
            paths: PathsConfig::default(),
            catalog: CatalogSettings::default(),
        }
    }
}

/// Credentials and endpoints resolved once at process start.
///
/// Passed explicitly into client construction so nothing below the CLI reads
/// the environment.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    api_keys: HashMap<Backend, String>,
    base_urls: HashMap<Backend, String>,
}

impl Credentials {
    /// Resolve from the process environment
    pub fn from_env(config: &Config) -> Self {
        Self::resolve(config, |name| std::env::var(name).ok())
    }

    /// Resolve using an arbitrary variable lookup
    pub fn resolve(config: &Config, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut credentials = Self::default();

        for backend in Backend::all() {
            let settings = config.provider(backend);

            if !settings.api_key_env.is_empty() {
                if let Some(key) = lookup(&settings.api_key_env).filter(|k| !k.trim().is_empty()) {
                    credentials.api_keys.insert(backend, key);
                }
            }

            let base_url = settings
                .base_url_env
                .as_deref()
                .and_then(|name| lookup(name))
                .filter(|url| !url.trim().is_empty())
                .unwrap_or(settings.base_url);
            credentials.base_urls.insert(backend, base_url);
        }

        credentials
    }

    pub fn with_api_key(mut self, backend: Backend, key: impl Into<String>) -> Self {
        self.api_keys.insert(backend, key.into());
        self
    }

    pub fn with_base_url(mut self, backend: Backend, url: impl Into<String>) -> Self {
        self.base_urls.insert(backend, url.into());
        self
    }

    pub fn api_key(&self, backend: Backend) -> Option<&str> {
        self.api_keys.get(&backend).map(String::as_str)
    }

    /// Endpoint for the backend, falling back to its built-in default
    pub fn base_url(&self, backend: Backend) -> &str {
        self.base_urls
            .get(&backend)
            .map(String::as_str)
            .unwrap_or_else(|| backend.default_base_url())
    }
}

/// Configuration errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
