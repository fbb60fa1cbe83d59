//! Domain errors for the Foreman coordination system.

use thiserror::Error;
use uuid::Uuid;

/// Format a cycle path as a human-readable string: `A -> B -> C -> A`.
fn format_cycle_path(path: &[Uuid]) -> String {
    path.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Domain-level errors that can occur in the Foreman system.
#[derive(Debug, Error)]
pub enum CoordinationError {
    #[error("Task not found: {0}")]
    TaskNotFound(Uuid),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid assignee: {0}")]
    InvalidAssignee(String),

    #[error("Task dependency cycle detected: {}", format_cycle_path(.0))]
    DependencyCycle(Vec<Uuid>),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

pub type CoordinationResult<T> = Result<T, CoordinationError>;

impl From<serde_json::Error> for CoordinationError {
    fn from(err: serde_json::Error) -> Self {
        CoordinationError::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for CoordinationError {
    fn from(err: std::io::Error) -> Self {
        CoordinationError::StorageError(err.to_string())
    }
}
