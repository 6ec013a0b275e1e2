//! Structured Extraction Benchmark
//!
//! Sends benchmark datasets to an OpenAI-compatible chat endpoint with a
//! structured-output schema, parses the answers into records, and judges
//! them field by field with `extract-judge`.
//!
//! # Benchmarks
//!
//! - `data_table_analysis`: table statistics from CSV-like text
//! - `financial_entities`: named entities from financial news
//! - `insurance_claims`: nested claim records with insured objects
//! - `pii_extraction`: 56 PII fields from free text
//!
//! # Example
//!
//! ```no_run
//! use extract_bench::{
//!     config::Config,
//!     providers::create_provider,
//!     runner::{run_benchmark, Executor, NoOpProgress},
//!     tasks::{dataset_path, load_dataset},
//! };
//! use extract_judge::{Benchmark, Judge};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::load_or_default();
//!     config.apply_env();
//!
//!     let provider = create_provider(&config.provider)?;
//!     let executor = Executor::new(provider, config.executor_config());
//!
//!     let benchmark = Benchmark::InsuranceClaims;
//!     let path = dataset_path(&config.benchmark.datasets_dir, benchmark);
//!     let dataset = load_dataset(path, benchmark, &config.sampling())?;
//!
//!     let judge = Judge::new(&config.judge_config(benchmark));
//!     let run = run_benchmark(&executor, &dataset, &judge, &NoOpProgress).await?;
//!     println!("overall accuracy: {:.2}", run.result.overall_accuracy);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod providers;
pub mod reporting;
pub mod runner;
pub mod schemas;
pub mod tasks;

pub use config::Config;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::config::{BenchmarkConfig, Config, ProviderConfig};
    pub use crate::providers::{
        create_provider, CompletionRequest, CompletionResponse, LLMProvider, Message,
        ProviderError, ProviderResult, ResponseFormat,
    };
    pub use crate::reporting::{print_console_report, ExampleReport, RunReport, RunSummary};
    pub use crate::runner::{
        parse_record, run_benchmark, BenchmarkRun, Executor, ExecutorConfig, ExtractionPlan,
    };
    pub use crate::tasks::{
        load_dataset, ExtractionTask, LoadedDataset, Sampling, TaskOutcome, TaskStatus,
    };
    pub use extract_judge::{Benchmark, BenchmarkResult, Judge, Prediction, Record};
}
