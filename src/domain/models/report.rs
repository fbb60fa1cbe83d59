//! Aggregate status reporting models.
//!
//! Consumed by the presentation layer (CLI / JSON emitter).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::task::{Role, TaskState};

/// Team-wide status summary across all tasks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamStatus {
    /// Total number of tasks in the registry
    pub total_tasks: usize,
    /// Counts keyed by lifecycle state name
    pub by_state: HashMap<String, usize>,
    /// Counts keyed by assignee role name
    pub by_assignee: HashMap<String, usize>,
    /// Counts keyed by priority name
    pub by_priority: HashMap<String, usize>,
    /// Total blocker entries across all tasks
    pub active_blockers: usize,
    /// Tasks in the `complete` state
    pub completed_tasks: usize,
    /// Tasks in implementing/reviewing/testing
    pub in_progress: usize,
    /// Tasks whose declared dependencies are all complete
    pub ready_to_start: usize,
    /// Number of distinct advisory parallel groups
    pub parallel_groups: usize,
}

/// Node in a recursive parent -> subtask tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskTreeNode {
    pub task_id: Uuid,
    pub title: String,
    pub state: TaskState,
    pub assignee: Role,
    pub subtasks: Vec<TaskTreeNode>,
}

impl TaskTreeNode {
    /// Total number of nodes in this tree, including the root.
    pub fn node_count(&self) -> usize {
        1 + self
            .subtasks
            .iter()
            .map(TaskTreeNode::node_count)
            .sum::<usize>()
    }
}
