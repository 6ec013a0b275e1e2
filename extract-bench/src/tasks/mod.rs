//! Extraction tasks, their outcomes, and dataset loading

pub mod catalog;
pub mod literal;
pub mod loader;

pub use catalog::{dataset_spec, system_prompt, DatasetSpec, TruthFormat};
pub use literal::{parse_literal, parse_literal_record, LiteralError};
pub use loader::{
    dataset_path, load_dataset, load_dataset_from_reader, load_predictions, parse_ground_truth,
    LoadError, LoadedDataset, Sampling,
};

use chrono::{DateTime, Utc};
use extract_judge::{Prediction, Record};
use serde::{Deserialize, Serialize};

use crate::providers::CompletionResponse;

/// One dataset row: the text to extract from and what should come out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionTask {
    pub id: String,
    pub input: String,
    pub ground_truth: Record,
}

impl ExtractionTask {
    pub fn new(id: impl Into<String>, input: impl Into<String>, ground_truth: Record) -> Self {
        Self {
            id: id.into(),
            input: input.into(),
            ground_truth,
        }
    }
}

/// Status of a task execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Success,
    /// The endpoint answered but the content was not a record
    ParseFailed,
    Error,
    Timeout,
    RateLimited,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Success => "success",
            TaskStatus::ParseFailed => "parse_failed",
            TaskStatus::Error => "error",
            TaskStatus::Timeout => "timeout",
            TaskStatus::RateLimited => "rate_limited",
        }
    }
}

/// Response data from a task execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResponse {
    pub content: String,
    pub model: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub latency_ms: u64,
    pub finish_reason: String,
}

impl From<CompletionResponse> for TaskResponse {
    fn from(resp: CompletionResponse) -> Self {
        Self {
            content: resp.content,
            model: resp.model,
            input_tokens: resp.input_tokens,
            output_tokens: resp.output_tokens,
            latency_ms: resp.latency_ms,
            finish_reason: resp.finish_reason,
        }
    }
}

/// What came back for one task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskOutcome {
    pub task_id: String,
    pub status: TaskStatus,
    pub response: Option<TaskResponse>,
    /// Parsed record when the extraction succeeded
    pub record: Option<Record>,
    pub error_message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl TaskOutcome {
    /// Response that parsed into a record
    pub fn success(task_id: impl Into<String>, response: CompletionResponse, record: Record) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Success,
            response: Some(response.into()),
            record: Some(record),
            error_message: None,
            timestamp: Utc::now(),
        }
    }

    /// Response whose content could not be parsed
    pub fn parse_failed(
        task_id: impl Into<String>,
        response: CompletionResponse,
        error: impl Into<String>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::ParseFailed,
            response: Some(response.into()),
            record: None,
            error_message: Some(error.into()),
            timestamp: Utc::now(),
        }
    }

    /// No usable response
    pub fn failure(task_id: impl Into<String>, status: TaskStatus, error: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            status,
            response: None,
            record: None,
            error_message: Some(error.into()),
            timestamp: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == TaskStatus::Success
    }

    pub fn latency_ms(&self) -> Option<u64> {
        self.response.as_ref().map(|r| r.latency_ms)
    }

    /// Prediction handed to the judge
    pub fn prediction(&self) -> Prediction {
        match &self.record {
            Some(record) => Prediction::Record(record.clone()),
            None => Prediction::failed(
                self.error_message
                    .clone()
                    .unwrap_or_else(|| self.status.as_str().to_string()),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use extract_judge::Value;

    fn response(content: &str) -> CompletionResponse {
        CompletionResponse {
            content: content.to_string(),
            model: "m".to_string(),
            input_tokens: 10,
            output_tokens: 5,
            finish_reason: "stop".to_string(),
            latency_ms: 42,
        }
    }

    #[test]
    fn test_success_prediction_carries_record() {
        let mut record = Record::new();
        record.insert("EMAIL".to_string(), Value::from("a@b.co"));
        let outcome = TaskOutcome::success("t1", response("{}"), record.clone());

        assert!(outcome.is_success());
        assert_eq!(outcome.latency_ms(), Some(42));
        assert_eq!(outcome.prediction(), Prediction::Record(record));
    }

    #[test]
    fn test_failures_become_failed_predictions() {
        let outcome = TaskOutcome::parse_failed("t1", response("nope"), "response is not valid JSON");
        assert_eq!(
            outcome.prediction().failure_reason(),
            Some("response is not valid JSON")
        );

        let timeout = TaskOutcome::failure("t2", TaskStatus::Timeout, "Timeout after 10ms");
        assert!(timeout.prediction().is_failed());
        assert_eq!(timeout.latency_ms(), None);
    }
}
