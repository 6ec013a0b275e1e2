//! Configuration management for the extraction benchmark
//!
//! Loads settings from a TOML file, then applies environment overrides.

use extract_judge::{Benchmark, FailurePolicy, JudgeConfig, TextNormalization};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::runner::ExecutorConfig;
use crate::tasks::Sampling;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub benchmark: BenchmarkConfig,
}

/// Endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Label used in logs and reports
    #[serde(default = "default_provider_name")]
    pub name: String,
    /// Chat completions base URL; the OpenAI API when unset
    #[serde(default)]
    pub base_url: Option<String>,
    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Key resolved from the environment at startup, never written out
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    /// Requests per minute
    #[serde(default = "default_rpm")]
    pub rpm: u32,
    /// Tokens per minute
    #[serde(default = "default_tpm")]
    pub tpm: u32,
    #[serde(default)]
    pub max_output_tokens: Option<u32>,
}

/// Benchmark execution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    #[serde(default = "default_benchmarks")]
    pub benchmarks: Vec<Benchmark>,
    #[serde(default = "default_datasets_dir")]
    pub datasets_dir: String,
    /// Rows per benchmark; zero or negative runs the whole dataset
    #[serde(default = "default_sample_size")]
    pub sample_size: i64,
    #[serde(default = "default_random_seed")]
    pub random_seed: u64,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_parallel_requests")]
    pub parallel_requests: usize,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_max_retry_delay_ms")]
    pub max_retry_delay_ms: u64,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    /// Text comparison override applied to every benchmark
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_normalization: Option<TextNormalization>,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    /// Also write raw model responses as JSON Lines
    #[serde(default)]
    pub save_responses: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            save_responses: false,
        }
    }
}

// Default value functions
fn default_provider_name() -> String { "openai".to_string() }
fn default_api_key_env() -> String { "OPENAI_API_KEY".to_string() }
fn default_model() -> String { "gpt-4".to_string() }
fn default_rpm() -> u32 { 500 }
fn default_tpm() -> u32 { 200_000 }
fn default_benchmarks() -> Vec<Benchmark> { Benchmark::all().to_vec() }
fn default_datasets_dir() -> String { "datasets".to_string() }
fn default_sample_size() -> i64 { -1 }
fn default_random_seed() -> u64 { 64 }
fn default_parallel_requests() -> usize { 5 }
fn default_retry_count() -> u32 { 3 }
fn default_retry_delay_ms() -> u64 { 1000 }
fn default_max_retry_delay_ms() -> u64 { 60_000 }
fn default_timeout_ms() -> u64 { 120_000 }
fn default_output_dir() -> String { "results/runs".to_string() }

const LOCAL_BASE_URL_VAR: &str = "LOCAL_OPENAI_BASE_URL";
const LOCAL_API_KEY: &str = "local-key";

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: default_provider_name(),
            base_url: None,
            api_key_env: default_api_key_env(),
            api_key: None,
            model: default_model(),
            rpm: default_rpm(),
            tpm: default_tpm(),
            max_output_tokens: None,
        }
    }
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            benchmarks: default_benchmarks(),
            datasets_dir: default_datasets_dir(),
            sample_size: default_sample_size(),
            random_seed: default_random_seed(),
            temperature: 0.0,
            parallel_requests: default_parallel_requests(),
            retry_count: default_retry_count(),
            retry_delay_ms: default_retry_delay_ms(),
            max_retry_delay_ms: default_max_retry_delay_ms(),
            timeout_ms: default_timeout_ms(),
            failure_policy: FailurePolicy::default(),
            text_normalization: None,
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load from default config location or return defaults
    pub fn load_or_default() -> Self {
        let config_paths = [
            "config/bench.toml",
            "../config/bench.toml",
            "extract-bench/config/bench.toml",
        ];

        for path in &config_paths {
            match Self::from_file(path) {
                Ok(config) => {
                    tracing::info!("Loaded configuration from {}", path);
                    return config;
                }
                Err(ConfigError::Parse(e)) => {
                    tracing::warn!("Ignoring invalid configuration {}: {}", path, e);
                }
                Err(_) => {}
            }
        }

        tracing::info!("Using default configuration");
        Self::default()
    }

    /// Save configuration to a TOML file
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any variable lookup.
    ///
    /// A set `LOCAL_OPENAI_BASE_URL` switches to a local endpoint, which takes
    /// `LOCAL_OPENAI_MODEL` and `LOCAL_OPENAI_API_KEY` in place of the
    /// `OPENAI_*` variables.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = var(LOCAL_BASE_URL_VAR) {
            self.provider.name = "local".to_string();
            self.provider.base_url = Some(url);
            self.provider.api_key = Some(
                var("LOCAL_OPENAI_API_KEY").unwrap_or_else(|| LOCAL_API_KEY.to_string()),
            );
            if let Some(model) = var("LOCAL_OPENAI_MODEL") {
                self.provider.model = model;
            }
        } else {
            if let Some(url) = var("OPENAI_BASE_URL") {
                self.provider.base_url = Some(url);
            }
            if let Some(model) = var("OPENAI_MODEL") {
                self.provider.model = model;
            }
            if self.provider.api_key.is_none() {
                self.provider.api_key = var(&self.provider.api_key_env);
            }
        }

        if let Some(size) = parsed::<i64>(var("SAMPLE_SIZE"), "SAMPLE_SIZE") {
            self.benchmark.sample_size = size;
        }
        if let Some(temperature) = parsed::<f32>(var("TEMPERATURE"), "TEMPERATURE") {
            self.benchmark.temperature = temperature;
        }
        if let Some(workers) = parsed::<usize>(var("MAX_WORKERS"), "MAX_WORKERS") {
            self.benchmark.parallel_requests = workers.max(1);
        }
    }

    /// Whether requests go to a local endpoint
    pub fn is_local(&self) -> bool {
        self.provider.name == "local"
    }

    pub fn executor_config(&self) -> ExecutorConfig {
        let b = &self.benchmark;
        ExecutorConfig {
            parallel_requests: b.parallel_requests,
            retry_count: b.retry_count,
            retry_delay_ms: b.retry_delay_ms,
            max_retry_delay_ms: b.max_retry_delay_ms,
            timeout_ms: b.timeout_ms,
            temperature: b.temperature,
            max_tokens: self.provider.max_output_tokens,
            model: Some(self.provider.model.clone()),
        }
    }

    /// Judging setup for a benchmark with the configured overrides
    pub fn judge_config(&self, benchmark: Benchmark) -> JudgeConfig {
        let config = benchmark
            .judge_config()
            .with_failure_policy(self.benchmark.failure_policy);
        match self.benchmark.text_normalization {
            Some(text) => config.with_text_normalization(text),
            None => config,
        }
    }

    pub fn sampling(&self) -> Sampling {
        Sampling::from_size(self.benchmark.sample_size, self.benchmark.random_seed)
    }
}

fn parsed<T: std::str::FromStr>(value: Option<String>, key: &str) -> Option<T> {
    let value = value?;
    match value.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("Ignoring {}={:?}: not a valid value", key, value);
            None
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
