//! Simulated task runner for tests and dry runs.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::models::Task;
use crate::domain::ports::{RunOutcome, TaskRunner};

/// Configured response for a simulated run.
#[derive(Debug, Clone)]
pub struct SimulatedResponse {
    /// Whether to simulate failure
    pub fail: bool,
    /// Error message if failing
    pub error_message: Option<String>,
    /// Artificial delay in milliseconds
    pub delay_ms: u64,
}

impl Default for SimulatedResponse {
    fn default() -> Self {
        Self {
            fail: false,
            error_message: None,
            delay_ms: 0,
        }
    }
}

impl SimulatedResponse {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            fail: true,
            error_message: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }
}

/// Runner that simulates role work instead of invoking an external actor.
///
/// Succeeds by default; individual tasks can be overridden to fail or to
/// take time, which is enough to exercise the executor's concurrency and
/// failure paths.
#[derive(Debug, Default)]
pub struct SimulatedRunner {
    default_response: SimulatedResponse,
    overrides: RwLock<HashMap<Uuid, SimulatedResponse>>,
}

impl SimulatedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_response(response: SimulatedResponse) -> Self {
        Self {
            default_response: response,
            overrides: RwLock::new(HashMap::new()),
        }
    }

    /// Override the response for a specific task.
    pub async fn set_response(&self, task_id: Uuid, response: SimulatedResponse) {
        self.overrides.write().await.insert(task_id, response);
    }

    /// Convenience: make a specific task fail.
    pub async fn fail_task(&self, task_id: Uuid, error: impl Into<String>) {
        self.set_response(task_id, SimulatedResponse::failure(error))
            .await;
    }
}

#[async_trait]
impl TaskRunner for SimulatedRunner {
    async fn run(&self, task: &Task) -> RunOutcome {
        let response = self
            .overrides
            .read()
            .await
            .get(&task.id)
            .cloned()
            .unwrap_or_else(|| self.default_response.clone());

        if response.delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(response.delay_ms)).await;
        }

        if response.fail {
            return RunOutcome::failure(
                response
                    .error_message
                    .unwrap_or_else(|| "Simulated failure".to_string()),
            );
        }

        let outputs = HashMap::from([
            ("task_id".to_string(), serde_json::json!(task.id)),
            ("task_title".to_string(), serde_json::json!(task.title)),
            ("completed".to_string(), serde_json::json!(true)),
        ]);
        RunOutcome::success(outputs)
    }
}
