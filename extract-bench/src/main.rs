//! Structured Extraction Benchmark CLI

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use extract_bench::{
    config::Config,
    providers::create_provider,
    reporting::{
        new_run_id, print_console_report, print_summary, write_responses, ExampleReport,
        RunReport, RunSummary,
    },
    runner::{run_benchmark, ConsoleProgress, Executor},
    tasks::{dataset_path, dataset_spec, load_dataset, load_predictions, Sampling},
};
use extract_judge::{Benchmark, FailurePolicy, Judge};

#[derive(Parser)]
#[command(name = "extract-bench")]
#[command(about = "Structured extraction benchmark for OpenAI-compatible LLM endpoints")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run benchmarks against the configured endpoint
    Run {
        /// Comma-separated benchmark list (default: from config)
        #[arg(short, long)]
        benchmarks: Option<String>,

        /// Rows per benchmark; zero or negative runs everything
        #[arg(short, long, allow_hyphen_values = true)]
        sample_size: Option<i64>,

        /// Model name sent with each request
        #[arg(short, long)]
        model: Option<String>,

        /// Number of parallel requests
        #[arg(long)]
        parallel: Option<usize>,

        /// Output directory for results
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory holding the dataset CSV files
        #[arg(short, long)]
        datasets: Option<PathBuf>,

        /// How failed extractions count toward field accuracy
        #[arg(long)]
        failure_policy: Option<FailurePolicy>,

        /// Save raw responses next to the reports
        #[arg(long)]
        save_responses: bool,
    },

    /// Judge a file of saved predictions against a dataset
    Judge {
        /// Benchmark the predictions belong to
        #[arg(short, long)]
        benchmark: Benchmark,

        /// JSON Lines file, one prediction per dataset row
        #[arg(short, long)]
        predictions: PathBuf,

        /// Dataset CSV (default: the benchmark's file in the datasets directory)
        #[arg(short, long)]
        dataset: Option<PathBuf>,

        /// Sample the dataset the same way the predictions were produced
        #[arg(short, long, allow_hyphen_values = true)]
        sample_size: Option<i64>,

        /// Write the report to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List available benchmarks
    ListBenchmarks,

    /// Generate sample configuration
    InitConfig {
        /// Output path for configuration file
        #[arg(short, long, default_value = "config/bench.toml")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("extract_bench=debug,extract_judge=debug,info")
    } else {
        EnvFilter::new("extract_bench=info,warn")
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load_or_default(),
    };
    config.apply_env();

    match cli.command {
        Commands::Run {
            benchmarks,
            sample_size,
            model,
            parallel,
            output,
            datasets,
            failure_policy,
            save_responses,
        } => {
            if let Some(list) = benchmarks {
                config.benchmark.benchmarks = parse_benchmarks(&list)?;
            }
            if let Some(size) = sample_size {
                config.benchmark.sample_size = size;
            }
            if let Some(model) = model {
                config.provider.model = model;
            }
            if let Some(parallel) = parallel {
                config.benchmark.parallel_requests = parallel.max(1);
            }
            if let Some(dir) = output {
                config.benchmark.output.output_dir = dir.display().to_string();
            }
            if let Some(dir) = datasets {
                config.benchmark.datasets_dir = dir.display().to_string();
            }
            if let Some(policy) = failure_policy {
                config.benchmark.failure_policy = policy;
            }
            config.benchmark.output.save_responses |= save_responses;

            run_benchmarks(&config).await?;
        }

        Commands::Judge {
            benchmark,
            predictions,
            dataset,
            sample_size,
            output,
        } => {
            judge_predictions(&config, benchmark, predictions, dataset, sample_size, output)?;
        }

        Commands::ListBenchmarks => {
            list_benchmarks(&config);
        }

        Commands::InitConfig { output } => {
            init_config(output)?;
        }
    }

    Ok(())
}

fn parse_benchmarks(list: &str) -> Result<Vec<Benchmark>, Box<dyn std::error::Error>> {
    let benchmarks = list
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect::<Result<Vec<Benchmark>, _>>()?;
    Ok(benchmarks)
}

async fn run_benchmarks(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let run_id = new_run_id();
    let run_dir = PathBuf::from(&config.benchmark.output.output_dir).join(&run_id);

    println!("=== Structured Extraction Benchmark ===");
    println!("Run ID: {}", run_id);

    let provider = create_provider(&config.provider)?;
    let executor = Executor::new(provider.clone(), config.executor_config());
    let model = executor.model().to_string();

    println!("Provider: {} ({})", provider.name(), model);
    println!("Benchmarks: {}", config.benchmark.benchmarks.len());
    println!();

    let mut summary = RunSummary::new(&run_id, &model, provider.name());
    let sampling = config.sampling();

    for &benchmark in &config.benchmark.benchmarks {
        let path = dataset_path(&config.benchmark.datasets_dir, benchmark);
        let dataset = match load_dataset(&path, benchmark, &sampling) {
            Ok(dataset) => dataset,
            Err(e) => {
                tracing::error!(
                    "Could not load {} from {} ({}): {}",
                    benchmark,
                    path.display(),
                    dataset_spec(benchmark).source_url,
                    e
                );
                continue;
            }
        };
        if dataset.skipped_rows > 0 {
            tracing::warn!(
                "{}: skipped {} rows with unreadable ground truth",
                benchmark,
                dataset.skipped_rows
            );
        }

        println!("Running {} ({} tasks)...", benchmark, dataset.len());
        let judge = Judge::new(&config.judge_config(benchmark));
        let run = run_benchmark(&executor, &dataset, &judge, &ConsoleProgress).await?;

        let report = RunReport::from_run(&run, &model, provider.name());
        print_console_report(&report);

        let report_path = run_dir.join(report.file_name());
        report.write_to_file(&report_path)?;
        tracing::info!("Report written to {}", report_path.display());

        if config.benchmark.output.save_responses {
            let responses_path = run_dir.join(format!("{}_responses.jsonl", benchmark));
            write_responses(&responses_path, &run.outcomes)?;
            tracing::info!("Responses written to {}", responses_path.display());
        }

        summary.add(&report);
    }

    if summary.benchmarks.is_empty() {
        return Err("no benchmark could be run".into());
    }

    summary.write_to_file(run_dir.join("summary.json"))?;
    print_summary(&summary);
    Ok(())
}

fn judge_predictions(
    config: &Config,
    benchmark: Benchmark,
    predictions_path: PathBuf,
    dataset_arg: Option<PathBuf>,
    sample_size: Option<i64>,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let path =
        dataset_arg.unwrap_or_else(|| dataset_path(&config.benchmark.datasets_dir, benchmark));
    let sampling = match sample_size {
        Some(size) => Sampling::from_size(size, config.benchmark.random_seed),
        None => Sampling::all(),
    };

    let dataset = load_dataset(&path, benchmark, &sampling)?;
    let predictions = load_predictions(&predictions_path)?;
    println!(
        "Judging {} predictions against {} {} tasks",
        predictions.len(),
        dataset.len(),
        benchmark
    );

    let judge = Judge::new(&config.judge_config(benchmark));
    let examples = judge.aggregate_aligned(&predictions, &dataset.ground_truths())?;
    let result = judge.summarize(&examples);

    let reports = dataset
        .tasks
        .iter()
        .zip(&examples)
        .zip(&predictions)
        .map(|((task, example), prediction)| {
            ExampleReport::from_scored(&task.id, example).with_error(prediction.failure_reason())
        })
        .collect();
    let report = RunReport::new(benchmark, "offline", "predictions", result, reports);
    print_console_report(&report);

    if let Some(output) = output {
        report.write_to_file(&output)?;
        println!("Report written to: {}", output.display());
    }
    Ok(())
}

fn list_benchmarks(config: &Config) {
    println!("Available Benchmarks ({}):", Benchmark::all().len());
    println!("{:-<60}", "");

    for benchmark in Benchmark::all() {
        let spec = dataset_spec(benchmark);
        let path = dataset_path(&config.benchmark.datasets_dir, benchmark);
        let status = if path.exists() { "found" } else { "missing" };
        println!("  {} | {}", benchmark, benchmark.description());
        println!("      {} ({}) | input: {}", path.display(), status, spec.input_column);
        println!("      source: {}", spec.source_url);
    }
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
