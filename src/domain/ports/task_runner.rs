use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::models::Task;

/// Result of running a single task through an external collaborator.
#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    /// Whether the run succeeded
    pub success: bool,
    /// Opaque outputs produced by the run
    pub outputs: HashMap<String, serde_json::Value>,
    /// Error description when the run failed
    pub error: Option<String>,
}

impl RunOutcome {
    /// Successful outcome with the given outputs.
    pub fn success(outputs: HashMap<String, serde_json::Value>) -> Self {
        Self {
            success: true,
            outputs,
            error: None,
        }
    }

    /// Failed outcome with an error description.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            outputs: HashMap::new(),
            error: Some(error.into()),
        }
    }
}

/// Port for the external actor that performs the actual work of a task.
///
/// The executor is agnostic to what the collaborator does; it only consumes
/// the outcome. Failures are reported through `RunOutcome`, never panics.
#[async_trait]
pub trait TaskRunner: Send + Sync {
    /// Run a single task to completion and report the outcome.
    async fn run(&self, task: &Task) -> RunOutcome;
}
