//! Results reporting

use extract_judge::{
    AlignmentSummary, Benchmark, BenchmarkResult, ExampleStatus, FailurePolicy, FieldCorrectness,
    ScoredExample,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::runner::BenchmarkRun;
use crate::tasks::{TaskOutcome, TaskStatus};

/// Timestamp layout used in reports
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Error type for writing and reading reports
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Identifier for one invocation, used as the output subdirectory
pub fn new_run_id() -> String {
    chrono::Local::now().format("%Y%m%d-%H%M%S").to_string()
}

fn timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Judged detail for one task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExampleReport {
    pub task_id: String,
    pub status: ExampleStatus,
    /// Executor status; absent for offline judging
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_status: Option<TaskStatus>,
    pub overall: bool,
    pub field_correctness: FieldCorrectness,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mismatches: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alignments: Vec<AlignmentSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

impl ExampleReport {
    pub fn from_scored(task_id: impl Into<String>, example: &ScoredExample) -> Self {
        Self {
            task_id: task_id.into(),
            status: example.status,
            task_status: None,
            overall: example.overall,
            field_correctness: example.field_correctness.clone(),
            mismatches: example.mismatches.iter().map(|m| m.to_string()).collect(),
            alignments: example.alignments.clone(),
            error: None,
            latency_ms: None,
        }
    }

    /// Attach what the executor saw for this task
    pub fn with_outcome(mut self, outcome: &TaskOutcome) -> Self {
        self.task_status = Some(outcome.status);
        self.error = outcome.error_message.clone();
        self.latency_ms = outcome.latency_ms();
        self
    }

    pub fn with_error(mut self, error: Option<&str>) -> Self {
        self.error = error.map(str::to_string);
        self
    }
}

/// Report for one benchmark run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub benchmark_name: Benchmark,
    pub model: String,
    pub provider: String,
    /// Tasks attempted
    pub sample_size: usize,
    /// Tasks whose response parsed into a record
    pub success_number: usize,
    pub failure_policy: FailurePolicy,
    pub timestamp: String,
    pub statistics: BenchmarkResult,
    pub examples: Vec<ExampleReport>,
}

impl RunReport {
    pub fn new(
        benchmark: Benchmark,
        model: impl Into<String>,
        provider: impl Into<String>,
        statistics: BenchmarkResult,
        examples: Vec<ExampleReport>,
    ) -> Self {
        Self {
            benchmark_name: benchmark,
            model: model.into(),
            provider: provider.into(),
            sample_size: statistics.total_examples,
            success_number: statistics.parsed_examples,
            failure_policy: statistics.failure_policy,
            timestamp: timestamp(),
            statistics,
            examples,
        }
    }

    /// Build from a finished run
    pub fn from_run(run: &BenchmarkRun, model: &str, provider: &str) -> Self {
        let examples = run
            .outcomes
            .iter()
            .zip(&run.examples)
            .map(|(outcome, example)| {
                ExampleReport::from_scored(&outcome.task_id, example).with_outcome(outcome)
            })
            .collect();
        Self::new(run.benchmark, model, provider, run.result.clone(), examples)
    }

    /// Where this report goes under a run directory
    pub fn file_name(&self) -> String {
        format!("{}.json", self.benchmark_name)
    }

    /// Write to JSON file, creating parent directories
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), ReportError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self, ReportError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// One benchmark's line in the run summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryLine {
    pub benchmark: Benchmark,
    pub sample_size: usize,
    pub success_number: usize,
    pub overall_accuracy: f64,
    pub parse_success_rate: f64,
    pub report_file: String,
}

/// JSON summary across the benchmarks of one invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub timestamp: String,
    pub model: String,
    pub provider: String,
    pub benchmarks: Vec<SummaryLine>,
}

impl RunSummary {
    pub fn new(run_id: impl Into<String>, model: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            timestamp: timestamp(),
            model: model.into(),
            provider: provider.into(),
            benchmarks: Vec::new(),
        }
    }

    pub fn add(&mut self, report: &RunReport) {
        self.benchmarks.push(SummaryLine {
            benchmark: report.benchmark_name,
            sample_size: report.sample_size,
            success_number: report.success_number,
            overall_accuracy: report.statistics.overall_accuracy,
            parse_success_rate: report.statistics.parse_success_rate,
            report_file: report.file_name(),
        });
    }

    /// Write to JSON file
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), ReportError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Write raw task outcomes as JSON Lines
pub fn write_responses(path: impl AsRef<Path>, outcomes: &[TaskOutcome]) -> Result<PathBuf, ReportError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = std::io::BufWriter::new(fs::File::create(path)?);
    for outcome in outcomes {
        serde_json::to_writer(&mut file, outcome)?;
        file.write_all(b"\n")?;
    }
    file.flush()?;
    Ok(path.to_path_buf())
}

/// Generate a console report for one benchmark
pub fn print_console_report(report: &RunReport) {
    let stats = &report.statistics;
    println!("\n=== {} ===\n", report.benchmark_name);
    println!("Model: {} ({})", report.model, report.provider);
    println!(
        "Samples: {}  Parsed: {}  Failures: {}",
        report.sample_size, report.success_number, stats.extraction_failures
    );
    println!("Failure policy: {}", report.failure_policy);
    println!("Overall accuracy: {:.2}%", stats.overall_accuracy * 100.0);

    if !stats.field_accuracy.is_empty() {
        println!("\nField Accuracy:");
        println!("{:-<50}", "");
        for (field, accuracy) in &stats.field_accuracy {
            let tally = stats
                .field_tallies
                .get(field)
                .map(|t| format!("{}/{}", t.correct, t.present))
                .unwrap_or_default();
            println!("  {:<36} {:>6.2}% {:>8}", field.as_str(), accuracy * 100.0, tally);
        }
    }

    println!("\n{:=<50}", "");
}

/// Print the cross-benchmark summary
pub fn print_summary(summary: &RunSummary) {
    println!("\nRun {} ({} / {})", summary.run_id, summary.provider, summary.model);
    println!("{:-<50}", "");
    for line in &summary.benchmarks {
        println!(
            "  {:<24} {:>6.2}%  ({}/{} parsed)",
            line.benchmark.as_str(),
            line.overall_accuracy * 100.0,
            line.success_number,
            line.sample_size
        );
    }
}
