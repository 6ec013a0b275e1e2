//! Benchmark execution engine

pub mod benchmark;
pub mod executor;
pub mod rate_limiter;
pub mod response;

pub use benchmark::{plan_for, run_benchmark, score_outcomes, BenchmarkRun};
pub use executor::{
    ConsoleProgress, Executor, ExecutorConfig, ExtractionPlan, NoOpProgress, ProgressCallback,
};
pub use rate_limiter::RateLimiter;
pub use response::{parse_record, ParseError};
