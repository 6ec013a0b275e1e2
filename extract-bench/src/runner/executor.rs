//! Async executor for extraction requests

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::sleep;

use crate::providers::{
    CompletionRequest, CompletionResponse, LLMProvider, Message, ProviderError, ResponseFormat,
};
use crate::runner::response::parse_record;
use crate::tasks::{ExtractionTask, TaskOutcome, TaskStatus};

/// Configuration for the executor
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum requests in flight
    pub parallel_requests: usize,
    /// Number of retries on failure
    pub retry_count: u32,
    /// Initial retry delay in milliseconds
    pub retry_delay_ms: u64,
    /// Maximum retry delay in milliseconds
    pub max_retry_delay_ms: u64,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    /// Model override; the provider default is used when unset
    pub model: Option<String>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            parallel_requests: 5,
            retry_count: 3,
            retry_delay_ms: 1000,
            max_retry_delay_ms: 60_000,
            timeout_ms: 120_000,
            temperature: 0.0,
            max_tokens: None,
            model: None,
        }
    }
}

/// What every request of one benchmark shares
#[derive(Debug, Clone)]
pub struct ExtractionPlan {
    pub system_prompt: String,
    pub response_format: Option<ResponseFormat>,
}

impl ExtractionPlan {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            response_format: None,
        }
    }

    pub fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = Some(format);
        self
    }
}

/// Executor for running extraction tasks against one provider
#[derive(Clone)]
pub struct Executor {
    config: ExecutorConfig,
    provider: Arc<dyn LLMProvider>,
    semaphore: Arc<Semaphore>,
}

impl Executor {
    pub fn new(provider: Arc<dyn LLMProvider>, config: ExecutorConfig) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.parallel_requests.max(1)));
        Self {
            config,
            provider,
            semaphore,
        }
    }

    pub fn provider(&self) -> &Arc<dyn LLMProvider> {
        &self.provider
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Model name requests go out with
    pub fn model(&self) -> &str {
        self.config
            .model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    /// Execute one task with retries
    pub async fn execute_task(&self, task: &ExtractionTask, plan: &ExtractionPlan) -> TaskOutcome {
        let _permit = match self.semaphore.acquire().await {
            Ok(permit) => permit,
            Err(e) => return TaskOutcome::failure(&task.id, TaskStatus::Error, e.to_string()),
        };

        let mut last_error = None;
        let mut delay = self.config.retry_delay_ms;

        for attempt in 0..=self.config.retry_count {
            if attempt > 0 {
                tracing::info!("Retry {} for task {} on {}", attempt, task.id, self.provider.name());
                sleep(Duration::from_millis(delay)).await;
                delay = (delay * 2).min(self.config.max_retry_delay_ms);
            }

            match self.try_execute(task, plan).await {
                Ok(response) => {
                    return match parse_record(&response.content) {
                        Ok(record) => {
                            tracing::debug!(
                                "Task {} extracted {} fields in {}ms",
                                task.id,
                                record.len(),
                                response.latency_ms
                            );
                            TaskOutcome::success(&task.id, response, record)
                        }
                        Err(e) => {
                            tracing::warn!("Task {} response did not parse: {}", task.id, e);
                            TaskOutcome::parse_failed(&task.id, response, e.to_string())
                        }
                    };
                }
                Err(ProviderError::RateLimited { retry_after_ms }) => {
                    tracing::warn!(
                        "Rate limited on {}, waiting {}ms",
                        self.provider.name(),
                        retry_after_ms
                    );
                    sleep(Duration::from_millis(retry_after_ms)).await;
                    last_error = Some(ProviderError::RateLimited { retry_after_ms });
                }
                Err(e) => {
                    tracing::error!(
                        "Error on {} for task {}: {}",
                        self.provider.name(),
                        task.id,
                        e
                    );
                    let retryable = e.is_retryable();
                    last_error = Some(e);
                    if !retryable {
                        break;
                    }
                }
            }
        }

        match last_error {
            Some(e) => TaskOutcome::failure(&task.id, status_for(&e), e.to_string()),
            None => TaskOutcome::failure(&task.id, TaskStatus::Error, "Unknown error"),
        }
    }

    /// Try to execute a task (single attempt)
    async fn try_execute(
        &self,
        task: &ExtractionTask,
        plan: &ExtractionPlan,
    ) -> Result<CompletionResponse, ProviderError> {
        let mut request = CompletionRequest::new(vec![Message::user(&task.input)])
            .with_model(self.model())
            .with_system(&plan.system_prompt)
            .with_temperature(self.config.temperature);
        if let Some(max_tokens) = self.config.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }
        if let Some(format) = &plan.response_format {
            request = request.with_response_format(format.clone());
        }

        let limiter = self.provider.rate_limiter();
        limiter
            .wait_for_token_capacity(estimate_tokens(&plan.system_prompt, &task.input))
            .await;

        let timeout = Duration::from_millis(self.config.timeout_ms);
        match tokio::time::timeout(timeout, self.provider.complete(&request)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout {
                timeout_ms: self.config.timeout_ms,
            }),
        }
    }

    /// Execute tasks concurrently; outcomes come back in task order
    pub async fn execute_tasks(
        &self,
        tasks: &[ExtractionTask],
        plan: &ExtractionPlan,
        progress: &dyn ProgressCallback,
    ) -> Vec<TaskOutcome> {
        let plan = Arc::new(plan.clone());
        let mut handles = Vec::with_capacity(tasks.len());

        for task in tasks {
            let task = task.clone();
            let plan = Arc::clone(&plan);
            let executor = self.clone();
            let handle = tokio::spawn(async move { executor.execute_task(&task, &plan).await });
            handles.push(handle);
        }

        let total = tasks.len();
        let mut outcomes = Vec::with_capacity(total);
        for (task, handle) in tasks.iter().zip(handles) {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!("Task execution panicked: {}", e);
                    TaskOutcome::failure(&task.id, TaskStatus::Error, format!("task panicked: {}", e))
                }
            };
            progress.on_task_complete(&outcome.task_id, outcome.status);
            outcomes.push(outcome);
            progress.on_progress(outcomes.len(), total);
        }

        outcomes
    }
}

fn status_for(error: &ProviderError) -> TaskStatus {
    match error {
        ProviderError::Timeout { .. } => TaskStatus::Timeout,
        ProviderError::RateLimited { .. } => TaskStatus::RateLimited,
        _ => TaskStatus::Error,
    }
}

/// Rough prompt size, four characters per token
fn estimate_tokens(system_prompt: &str, input: &str) -> u32 {
    ((system_prompt.len() + input.len()) / 4) as u32
}

/// Progress callback for tracking execution
pub trait ProgressCallback: Send + Sync {
    fn on_task_complete(&self, task_id: &str, status: TaskStatus);
    fn on_progress(&self, completed: usize, total: usize);
}

/// Default no-op progress callback
pub struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_task_complete(&self, _task_id: &str, _status: TaskStatus) {}
    fn on_progress(&self, _completed: usize, _total: usize) {}
}

/// Console progress callback
pub struct ConsoleProgress;

impl ProgressCallback for ConsoleProgress {
    fn on_task_complete(&self, task_id: &str, status: TaskStatus) {
        if status != TaskStatus::Success {
            println!("  {} {}", task_id, status.as_str().to_uppercase());
        }
    }

    fn on_progress(&self, completed: usize, total: usize) {
        if completed == total || completed % 10 == 0 {
            println!("Progress: {}/{} tasks complete", completed, total);
        }
    }
}
