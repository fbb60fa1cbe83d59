//! Coordination facade.
//!
//! Ties the registry, scheduler, and executor together behind the operation
//! set external callers (CLI, orchestration layers) consume. All reads
//! reflect the latest committed registry state; mutations are serialized by
//! the registry's writer lock.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::errors::{CoordinationError, CoordinationResult};
use crate::domain::models::{Config, Task, TaskTreeNode, TeamStatus};
use crate::domain::ports::{SnapshotStore, TaskRunner};
use crate::services::level_executor::{ExecutionReport, ExecutorConfig, LevelExecutor};
use crate::services::level_scheduler::{LevelScheduler, SchedulePlan};
use crate::services::registry::{TaskRegistry, TransitionUpdate};

/// Facade over the coordination core.
pub struct Coordinator {
    registry: Arc<TaskRegistry>,
    scheduler: LevelScheduler,
    config: Config,
    store: Option<Arc<dyn SnapshotStore>>,
}

impl Coordinator {
    pub fn new(config: Config) -> Self {
        Self {
            registry: Arc::new(TaskRegistry::new()),
            scheduler: LevelScheduler::new(),
            config,
            store: None,
        }
    }

    /// Attach a snapshot persistence collaborator.
    pub fn with_store(mut self, store: Arc<dyn SnapshotStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Shared handle to the underlying registry.
    pub fn registry(&self) -> Arc<TaskRegistry> {
        self.registry.clone()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Create a task. The task is validated and checked against the current
    /// collection for dependency cycles.
    #[instrument(skip(self, task), fields(task_id = %task.id))]
    pub async fn create_task(&self, task: Task) -> CoordinationResult<Uuid> {
        self.registry.insert(task).await
    }

    /// Create a subtask under a parent. Grouping only: no dependency on the
    /// parent is implied.
    #[instrument(skip(self, task), fields(parent_id = %parent_id))]
    pub async fn create_subtask(&self, parent_id: Uuid, task: Task) -> CoordinationResult<Uuid> {
        self.registry.insert(task.with_parent(parent_id)).await
    }

    /// Add a dependency edge between two existing tasks.
    pub async fn add_dependency(&self, task_id: Uuid, depends_on: Uuid) -> CoordinationResult<()> {
        self.registry.add_dependency(task_id, depends_on).await
    }

    /// Transition a task, optionally handing off to a new role.
    pub async fn transition(
        &self,
        task_id: Uuid,
        new_state: &str,
        new_assignee: Option<&str>,
        notes: Option<&str>,
    ) -> CoordinationResult<Task> {
        self.registry
            .transition(task_id, new_state, new_assignee, notes)
            .await
    }

    /// Transition with context/deliverable updates.
    pub async fn transition_with(
        &self,
        task_id: Uuid,
        new_state: &str,
        new_assignee: Option<&str>,
        notes: Option<&str>,
        update: TransitionUpdate,
    ) -> CoordinationResult<Task> {
        self.registry
            .transition_with(task_id, new_state, new_assignee, notes, update)
            .await
    }

    pub async fn add_blocker(
        &self,
        task_id: Uuid,
        reason: impl Into<String>,
    ) -> CoordinationResult<Task> {
        self.registry.add_blocker(task_id, reason).await
    }

    pub async fn remove_blocker(&self, task_id: Uuid, index: usize) -> CoordinationResult<Task> {
        self.registry.remove_blocker(task_id, index).await
    }

    pub async fn set_quality_gate(
        &self,
        task_id: Uuid,
        gate: &str,
        passed: bool,
    ) -> CoordinationResult<Task> {
        self.registry.set_quality_gate(task_id, gate, passed).await
    }

    pub async fn get_task(&self, task_id: Uuid) -> CoordinationResult<Task> {
        self.registry
            .get(task_id)
            .await
            .ok_or(CoordinationError::TaskNotFound(task_id))
    }

    pub async fn list_tasks(&self) -> Vec<Task> {
        self.registry.list().await
    }

    /// Tasks whose declared dependencies are all complete, excluding
    /// blocked and terminal tasks.
    pub async fn ready_tasks(&self) -> Vec<Task> {
        self.registry.ready_tasks().await
    }

    /// Advisory parallel-group query, independent of the level scheduler.
    pub async fn parallel_groups(&self) -> HashMap<String, Vec<Task>> {
        self.registry.parallel_groups().await
    }

    pub async fn team_status(&self) -> TeamStatus {
        self.registry.team_status().await
    }

    pub async fn task_tree(&self, task_id: Uuid) -> CoordinationResult<TaskTreeNode> {
        self.registry.task_tree(task_id).await
    }

    /// Compute the level schedule for the current collection.
    pub async fn plan(&self) -> SchedulePlan {
        let tasks = self.registry.list().await;
        self.scheduler.plan(&tasks)
    }

    /// Build an executor bound to this coordinator's registry, for callers
    /// that need the cancel handle.
    pub fn build_executor(
        &self,
        runner: Arc<dyn TaskRunner>,
        gate_tasks: Vec<Uuid>,
    ) -> LevelExecutor {
        LevelExecutor::new(
            self.registry.clone(),
            runner,
            ExecutorConfig {
                max_parallel_tasks: self.config.max_parallel_tasks,
                gate_tasks,
            },
        )
    }

    /// Plan and execute the current collection in one call.
    #[instrument(skip(self, runner, gate_tasks))]
    pub async fn execute(
        &self,
        runner: Arc<dyn TaskRunner>,
        gate_tasks: Vec<Uuid>,
    ) -> CoordinationResult<ExecutionReport> {
        let plan = self.plan().await;
        info!(
            levels = plan.total_levels(),
            unscheduled = plan.unscheduled.len(),
            "executing schedule plan"
        );
        let executor = self.build_executor(runner, gate_tasks);
        executor.execute(&plan).await
    }

    /// Load the task collection from the snapshot store.
    pub async fn load(&self) -> CoordinationResult<usize> {
        let store = self
            .store
            .as_ref()
            .ok_or_else(|| CoordinationError::StorageError("No snapshot store configured".into()))?;
        let snapshot = store.load().await?;
        let count = snapshot.tasks.len();
        self.registry.restore(snapshot).await;
        Ok(count)
    }

    /// Save the current task collection to the snapshot store.
    pub async fn save(&self) -> CoordinationResult<()> {
        let store = self
            .store
            .as_ref()
            .ok_or_else(|| CoordinationError::StorageError("No snapshot store configured".into()))?;
        let snapshot = self.registry.snapshot().await;
        store.save(&snapshot).await
    }
}
