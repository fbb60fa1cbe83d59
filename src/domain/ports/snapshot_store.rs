use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::CoordinationResult;
use crate::domain::models::Task;

/// A point-in-time copy of the full task collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub tasks: Vec<Task>,
    pub saved_at: Option<DateTime<Utc>>,
}

impl TaskSnapshot {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self {
            tasks,
            saved_at: Some(Utc::now()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Port for snapshot persistence.
///
/// Both operations are all-or-nothing: a failed save must leave any previous
/// snapshot intact, and a load either returns a full snapshot or an error.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load the last saved snapshot. Returns an empty snapshot when none
    /// has been saved yet.
    async fn load(&self) -> CoordinationResult<TaskSnapshot>;

    /// Persist a snapshot, replacing any previous one.
    async fn save(&self, snapshot: &TaskSnapshot) -> CoordinationResult<()>;
}
