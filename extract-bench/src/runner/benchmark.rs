//! One benchmark pass: request every task, then judge the answers

use extract_judge::{Benchmark, BenchmarkResult, Judge, Prediction, ScoredExample};

use super::executor::{Executor, ExtractionPlan, ProgressCallback};
use crate::schemas;
use crate::tasks::{system_prompt, ExtractionTask, LoadedDataset, TaskOutcome};

/// Everything produced by one benchmark pass, in task order
#[derive(Debug, Clone)]
pub struct BenchmarkRun {
    pub benchmark: Benchmark,
    pub outcomes: Vec<TaskOutcome>,
    pub examples: Vec<ScoredExample>,
    pub result: BenchmarkResult,
}

/// Prompt and structured-output schema for a benchmark
pub fn plan_for(benchmark: Benchmark) -> ExtractionPlan {
    ExtractionPlan::new(system_prompt(benchmark))
        .with_response_format(schemas::response_format(benchmark))
}

/// Judge executor outcomes against their tasks
pub fn score_outcomes(
    judge: &Judge,
    tasks: &[ExtractionTask],
    outcomes: &[TaskOutcome],
) -> extract_judge::Result<(Vec<ScoredExample>, BenchmarkResult)> {
    let predictions: Vec<Prediction> = outcomes.iter().map(TaskOutcome::prediction).collect();
    let ground_truths: Vec<_> = tasks.iter().map(|t| t.ground_truth.clone()).collect();

    let examples = judge.aggregate_aligned(&predictions, &ground_truths)?;
    let result = judge.summarize(&examples);
    Ok((examples, result))
}

/// Run every task of a dataset and judge the results
pub async fn run_benchmark(
    executor: &Executor,
    dataset: &LoadedDataset,
    judge: &Judge,
    progress: &dyn ProgressCallback,
) -> extract_judge::Result<BenchmarkRun> {
    tracing::info!(
        "Running {} ({} tasks) on {} / {}",
        dataset.benchmark,
        dataset.len(),
        executor.provider().name(),
        executor.model()
    );

    let plan = plan_for(dataset.benchmark);
    let outcomes = executor.execute_tasks(&dataset.tasks, &plan, progress).await;
    let (examples, result) = score_outcomes(judge, &dataset.tasks, &outcomes)?;

    tracing::info!(
        "{}: {}/{} parsed, overall accuracy {:.2}%",
        dataset.benchmark,
        result.parsed_examples,
        result.total_examples,
        result.overall_accuracy * 100.0
    );

    Ok(BenchmarkRun {
        benchmark: dataset.benchmark,
        outcomes,
        examples,
        result,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::TaskStatus;
    use extract_judge::{record_from_json, JudgeError};
    use serde_json::json;

    fn task(id: &str, truth: serde_json::Value) -> ExtractionTask {
        ExtractionTask::new(id, "text", record_from_json(truth).unwrap())
    }

    #[test]
    fn test_score_outcomes_counts_failures() {
        let judge = Judge::new(&Benchmark::PiiExtraction.judge_config());
        let tasks = vec![
            task("a", json!({"EMAIL": "a@b.co", "CITY": "Oslo"})),
            task("b", json!({"EMAIL": "c@d.co", "CITY": null})),
        ];
        let outcomes = vec![
            TaskOutcome {
                record: record_from_json(json!({"EMAIL": "a@b.co", "CITY": "Oslo"})),
                ..TaskOutcome::failure("a", TaskStatus::Success, "")
            },
            TaskOutcome::failure("b", TaskStatus::Timeout, "Timeout after 10ms"),
        ];

        let (examples, result) = score_outcomes(&judge, &tasks, &outcomes).unwrap();
        assert!(examples[0].overall);
        assert!(examples[1].is_failure());
        assert_eq!(result.overall_accuracy, 0.5);
        assert_eq!(result.extraction_failures, 1);
        assert_eq!(result.accuracy_for("EMAIL"), Some(0.5));
    }

    #[test]
    fn test_score_outcomes_rejects_length_mismatch() {
        let judge = Judge::default();
        let tasks = vec![task("a", json!({"x": 1}))];
        let err = score_outcomes(&judge, &tasks, &[]).unwrap_err();
        assert!(matches!(
            err,
            JudgeError::LengthMismatch {
                predictions: 0,
                ground_truths: 1
            }
        ));
    }

    #[test]
    fn test_plan_uses_benchmark_schema() {
        let plan = plan_for(Benchmark::InsuranceClaims);
        assert_eq!(plan.response_format.unwrap().name, "InsuranceClaim");
        assert!(plan.system_prompt.contains("insurance claim"));
    }
}
