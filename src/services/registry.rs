//! In-memory task registry and lifecycle state machine.
//!
//! All lifecycle mutations go through this registry; it holds the task
//! collection behind a single writer lock so a handoff (role + state) is
//! applied as one atomic unit and readers never observe a partially-applied
//! transition. Persistence happens only through explicit snapshots, never as
//! a side effect of a read.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::domain::errors::{CoordinationError, CoordinationResult};
use crate::domain::models::{
    Role, Task, TaskContext, TaskState, TaskTreeNode, TeamStatus,
};
use crate::domain::ports::TaskSnapshot;
use crate::services::dependency_graph::detect_cycle;

/// Optional payload that rides along with a transition.
#[derive(Debug, Clone, Default)]
pub struct TransitionUpdate {
    /// Context entries to merge into the task context
    pub context_update: Option<TaskContext>,
    /// Deliverable record to append
    pub deliverable: Option<String>,
}

/// Task collection guarded by a single coordination boundary.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: RwLock<HashMap<Uuid, Task>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
        }
    }

    /// Number of tasks in the registry.
    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }

    /// Insert a new task.
    ///
    /// Validates task invariants, rejects dependency cycles introduced by
    /// the new task, and links the parent's subtask list when a parent is
    /// declared. Dependencies referencing unknown ids are allowed (treated
    /// as externally satisfied) and logged.
    #[instrument(skip(self, task), fields(task_id = %task.id))]
    pub async fn insert(&self, task: Task) -> CoordinationResult<Uuid> {
        task.validate()
            .map_err(CoordinationError::ValidationFailed)?;

        let mut tasks = self.tasks.write().await;

        if tasks.contains_key(&task.id) {
            return Err(CoordinationError::ValidationFailed(format!(
                "Task id {} already exists",
                task.id
            )));
        }

        if let Some(parent_id) = task.parent_task {
            if !tasks.contains_key(&parent_id) {
                return Err(CoordinationError::TaskNotFound(parent_id));
            }
        }

        for dep_id in &task.dependencies {
            if !tasks.contains_key(dep_id) {
                warn!(
                    task_id = %task.id,
                    dependency_id = %dep_id,
                    "task created with dependency on unknown id"
                );
            }
        }

        let mut with_new: Vec<Task> = tasks.values().cloned().collect();
        with_new.push(task.clone());
        if let Some(cycle) = detect_cycle(&with_new) {
            return Err(CoordinationError::DependencyCycle(cycle));
        }

        let task_id = task.id;
        if let Some(parent_id) = task.parent_task {
            if let Some(parent) = tasks.get_mut(&parent_id) {
                parent.subtasks.push(task_id);
                parent.updated_at = Utc::now();
            }
        }

        info!(task_id = %task_id, title = %task.title, "task created");
        tasks.insert(task_id, task);
        Ok(task_id)
    }

    /// Get a task by id.
    pub async fn get(&self, id: Uuid) -> Option<Task> {
        self.tasks.read().await.get(&id).cloned()
    }

    /// List all tasks ordered by creation time.
    pub async fn list(&self) -> Vec<Task> {
        let tasks = self.tasks.read().await;
        let mut all: Vec<Task> = tasks.values().cloned().collect();
        all.sort_by_key(|t| (t.created_at, t.id));
        all
    }

    /// Transition a task's lifecycle state, optionally handing off to a new
    /// role.
    pub async fn transition(
        &self,
        task_id: Uuid,
        new_state: &str,
        new_assignee: Option<&str>,
        notes: Option<&str>,
    ) -> CoordinationResult<Task> {
        self.transition_with(task_id, new_state, new_assignee, notes, TransitionUpdate::default())
            .await
    }

    /// Transition with context/deliverable updates applied in the same
    /// atomic mutation.
    ///
    /// Rules:
    /// - A role change appends a `HandoffRecord` capturing the
    ///   pre-transition state and assignee; a state change alone appends
    ///   nothing.
    /// - A transition into `iteration` increments `iteration_count`; past
    ///   `max_iterations` a blocker is appended and the task is forced into
    ///   `blocked` in the same mutation.
    /// - Any transition while the blocker list is non-empty lands in
    ///   `blocked`; the requested state becomes the resume target.
    #[instrument(skip(self, update), fields(task_id = %task_id, new_state = new_state))]
    pub async fn transition_with(
        &self,
        task_id: Uuid,
        new_state: &str,
        new_assignee: Option<&str>,
        notes: Option<&str>,
        update: TransitionUpdate,
    ) -> CoordinationResult<Task> {
        let requested = TaskState::from_str(new_state)
            .ok_or_else(|| CoordinationError::InvalidState(new_state.to_string()))?;

        let assignee = match new_assignee {
            Some(name) => Some(
                Role::from_str(name)
                    .ok_or_else(|| CoordinationError::InvalidAssignee(name.to_string()))?,
            ),
            None => None,
        };

        let mut tasks = self.tasks.write().await;
        let task = tasks
            .get_mut(&task_id)
            .ok_or(CoordinationError::TaskNotFound(task_id))?;

        if let Some(role) = assignee {
            if role != task.assignee {
                task.record_handoff(role, notes.unwrap_or_default());
            }
        }

        if requested == TaskState::Iteration {
            task.iteration_count += 1;
        }
        if requested != TaskState::Blocked {
            task.resume_state = requested;
        }
        task.state = requested;

        if requested == TaskState::Iteration && task.iteration_count > task.max_iterations {
            // Bound exceeded: blocker + blocked, atomically with the
            // transition that crossed it.
            let reason = format!("Maximum iterations ({}) exceeded", task.max_iterations);
            warn!(task_id = %task_id, %reason, "iteration limit reached");
            task.add_blocker(reason);
        } else if !task.blockers.is_empty() {
            task.state = TaskState::Blocked;
        }

        if let Some(context) = update.context_update {
            task.context.merge(context);
        }
        if let Some(deliverable) = update.deliverable {
            task.deliverables.push(deliverable);
        }
        task.updated_at = Utc::now();

        debug!(task_id = %task_id, state = %task.state, "transition applied");
        Ok(task.clone())
    }

    /// Append a blocker, forcing the task into `blocked`.
    #[instrument(skip(self, reason), fields(task_id = %task_id))]
    pub async fn add_blocker(
        &self,
        task_id: Uuid,
        reason: impl Into<String>,
    ) -> CoordinationResult<Task> {
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .get_mut(&task_id)
            .ok_or(CoordinationError::TaskNotFound(task_id))?;
        task.add_blocker(reason.into());
        Ok(task.clone())
    }

    /// Remove a blocker by index. Clearing the last blocker restores the
    /// state recorded before blocking.
    #[instrument(skip(self), fields(task_id = %task_id, index))]
    pub async fn remove_blocker(&self, task_id: Uuid, index: usize) -> CoordinationResult<Task> {
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .get_mut(&task_id)
            .ok_or(CoordinationError::TaskNotFound(task_id))?;
        if !task.remove_blocker(index) {
            return Err(CoordinationError::ValidationFailed(format!(
                "No blocker at index {index}"
            )));
        }
        Ok(task.clone())
    }

    /// Set a named quality gate. Never triggers a state transition.
    #[instrument(skip(self), fields(task_id = %task_id, gate))]
    pub async fn set_quality_gate(
        &self,
        task_id: Uuid,
        gate: &str,
        passed: bool,
    ) -> CoordinationResult<Task> {
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .get_mut(&task_id)
            .ok_or(CoordinationError::TaskNotFound(task_id))?;
        task.set_quality_gate(gate, passed);
        Ok(task.clone())
    }

    /// Add a dependency edge between two known tasks.
    ///
    /// Rejects unknown ids, self-dependencies, and edges that would
    /// introduce a cycle.
    #[instrument(skip(self), fields(task_id = %task_id, depends_on = %depends_on))]
    pub async fn add_dependency(&self, task_id: Uuid, depends_on: Uuid) -> CoordinationResult<()> {
        if task_id == depends_on {
            return Err(CoordinationError::ValidationFailed(
                "Task cannot depend on itself".to_string(),
            ));
        }

        let mut tasks = self.tasks.write().await;
        if !tasks.contains_key(&depends_on) {
            return Err(CoordinationError::TaskNotFound(depends_on));
        }
        let task = tasks
            .get(&task_id)
            .ok_or(CoordinationError::TaskNotFound(task_id))?;

        if task.dependencies.contains(&depends_on) {
            return Ok(());
        }

        let mut candidate: Vec<Task> = tasks.values().cloned().collect();
        if let Some(t) = candidate.iter_mut().find(|t| t.id == task_id) {
            t.dependencies.push(depends_on);
        }
        if let Some(cycle) = detect_cycle(&candidate) {
            return Err(CoordinationError::DependencyCycle(cycle));
        }

        if let Some(task) = tasks.get_mut(&task_id) {
            task.dependencies.push(depends_on);
            task.updated_at = Utc::now();
        }
        Ok(())
    }

    /// Record a successful run: `complete` plus opaque outputs.
    pub async fn record_run_success(
        &self,
        task_id: Uuid,
        outputs: HashMap<String, serde_json::Value>,
    ) -> CoordinationResult<Task> {
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .get_mut(&task_id)
            .ok_or(CoordinationError::TaskNotFound(task_id))?;
        task.state = TaskState::Complete;
        task.resume_state = TaskState::Complete;
        task.outputs.extend(outputs);
        task.updated_at = Utc::now();
        Ok(task.clone())
    }

    /// Record a failed run: terminal `failed` marker.
    pub async fn record_run_failure(&self, task_id: Uuid) -> CoordinationResult<Task> {
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .get_mut(&task_id)
            .ok_or(CoordinationError::TaskNotFound(task_id))?;
        task.state = TaskState::Failed;
        task.updated_at = Utc::now();
        Ok(task.clone())
    }

    /// Record a cancelled run: the task was never admitted.
    pub async fn record_run_cancelled(&self, task_id: Uuid) -> CoordinationResult<Task> {
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .get_mut(&task_id)
            .ok_or(CoordinationError::TaskNotFound(task_id))?;
        task.state = TaskState::Cancelled;
        task.updated_at = Utc::now();
        Ok(task.clone())
    }

    /// Tasks whose declared dependencies are all complete, excluding tasks
    /// that are blocked or already terminal. Ordered by priority, then
    /// creation time.
    pub async fn ready_tasks(&self) -> Vec<Task> {
        let tasks = self.tasks.read().await;
        let completed: HashSet<Uuid> = tasks
            .values()
            .filter(|t| t.state == TaskState::Complete)
            .map(|t| t.id)
            .collect();

        let mut ready: Vec<Task> = tasks
            .values()
            .filter(|t| t.state != TaskState::Blocked && !t.is_terminal())
            .filter(|t| {
                t.dependencies
                    .iter()
                    // Unknown dependency ids are externally satisfied
                    .all(|dep| completed.contains(dep) || !tasks.contains_key(dep))
            })
            .cloned()
            .collect();

        ready.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then(a.created_at.cmp(&b.created_at))
                .then(a.id.cmp(&b.id))
        });
        ready
    }

    /// Tasks grouped by their advisory parallel-group label.
    ///
    /// Distinct from scheduler levels: this is the ad-hoc grouping callers
    /// attach at creation time.
    pub async fn parallel_groups(&self) -> HashMap<String, Vec<Task>> {
        let tasks = self.tasks.read().await;
        let mut groups: HashMap<String, Vec<Task>> = HashMap::new();
        for task in tasks.values() {
            if let Some(group) = &task.parallel_group {
                groups.entry(group.clone()).or_default().push(task.clone());
            }
        }
        for members in groups.values_mut() {
            members.sort_by_key(|t| (t.created_at, t.id));
        }
        groups
    }

    /// Aggregate team-wide status.
    pub async fn team_status(&self) -> TeamStatus {
        let ready_count = self.ready_tasks().await.len();
        let group_count = self.parallel_groups().await.len();

        let tasks = self.tasks.read().await;
        let mut status = TeamStatus {
            total_tasks: tasks.len(),
            ready_to_start: ready_count,
            parallel_groups: group_count,
            ..TeamStatus::default()
        };

        for task in tasks.values() {
            *status
                .by_state
                .entry(task.state.as_str().to_string())
                .or_insert(0) += 1;
            *status
                .by_assignee
                .entry(task.assignee.as_str().to_string())
                .or_insert(0) += 1;
            *status
                .by_priority
                .entry(task.priority.as_str().to_string())
                .or_insert(0) += 1;

            status.active_blockers += task.blockers.len();

            match task.state {
                TaskState::Complete => status.completed_tasks += 1,
                TaskState::Implementing | TaskState::Reviewing | TaskState::Testing => {
                    status.in_progress += 1;
                }
                _ => {}
            }
        }

        status
    }

    /// Recursive parent -> subtask tree rooted at the given task.
    pub async fn task_tree(&self, task_id: Uuid) -> CoordinationResult<TaskTreeNode> {
        let tasks = self.tasks.read().await;
        if !tasks.contains_key(&task_id) {
            return Err(CoordinationError::TaskNotFound(task_id));
        }
        Ok(build_tree(task_id, &tasks, &mut HashSet::new()))
    }

    /// Point-in-time copy of the whole collection.
    pub async fn snapshot(&self) -> TaskSnapshot {
        let tasks = self.tasks.read().await;
        let mut all: Vec<Task> = tasks.values().cloned().collect();
        all.sort_by_key(|t| (t.created_at, t.id));
        TaskSnapshot::new(all)
    }

    /// Replace the collection with a loaded snapshot.
    pub async fn restore(&self, snapshot: TaskSnapshot) {
        let mut tasks = self.tasks.write().await;
        *tasks = snapshot.tasks.into_iter().map(|t| (t.id, t)).collect();
        info!(task_count = tasks.len(), "registry restored from snapshot");
    }
}

fn build_tree(
    task_id: Uuid,
    tasks: &HashMap<Uuid, Task>,
    seen: &mut HashSet<Uuid>,
) -> TaskTreeNode {
    let task = &tasks[&task_id];
    let mut node = TaskTreeNode {
        task_id,
        title: task.title.clone(),
        state: task.state,
        assignee: task.assignee,
        subtasks: Vec::new(),
    };
    seen.insert(task_id);
    for &subtask_id in &task.subtasks {
        if tasks.contains_key(&subtask_id) && !seen.contains(&subtask_id) {
            node.subtasks.push(build_tree(subtask_id, tasks, seen));
        }
    }
    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::TaskPriority;

    async fn registry_with(tasks: Vec<Task>) -> TaskRegistry {
        let registry = TaskRegistry::new();
        for task in tasks {
            registry.insert(task).await.unwrap();
        }
        registry
    }

    #[tokio::test]
    async fn test_transition_unknown_task() {
        let registry = TaskRegistry::new();
        let err = registry
            .transition(Uuid::new_v4(), "planning", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, CoordinationError::TaskNotFound(_)));
    }

    #[tokio::test]
    async fn test_transition_invalid_state() {
        let task = Task::new("T", "d", Role::Coder);
        let id = task.id;
        let registry = registry_with(vec![task]).await;

        let err = registry
            .transition(id, "daydreaming", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, CoordinationError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_transition_invalid_assignee() {
        let task = Task::new("T", "d", Role::Coder);
        let id = task.id;
        let registry = registry_with(vec![task]).await;

        let err = registry
            .transition(id, "planning", Some("intern"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, CoordinationError::InvalidAssignee(_)));
    }

    #[tokio::test]
    async fn test_role_change_appends_handoff() {
        let task = Task::new("T", "d", Role::Architect);
        let id = task.id;
        let registry = registry_with(vec![task]).await;

        let updated = registry
            .transition(id, "implementing", Some("coder"), Some("design done"))
            .await
            .unwrap();

        assert_eq!(updated.assignee, Role::Coder);
        assert_eq!(updated.state, TaskState::Implementing);
        assert_eq!(updated.handoffs.len(), 1);
        // Handoff captures the pre-transition state and assignee
        assert_eq!(updated.handoffs[0].from_role, Role::Architect);
        assert_eq!(updated.handoffs[0].state_at_handoff, TaskState::Analyzing);
        assert_eq!(updated.handoffs[0].notes, "design done");
    }

    #[tokio::test]
    async fn test_state_change_without_role_change_no_handoff() {
        let task = Task::new("T", "d", Role::Coder);
        let id = task.id;
        let registry = registry_with(vec![task]).await;

        let updated = registry
            .transition(id, "implementing", Some("coder"), None)
            .await
            .unwrap();
        assert!(updated.handoffs.is_empty());

        let updated = registry
            .transition(id, "reviewing", None, None)
            .await
            .unwrap();
        assert!(updated.handoffs.is_empty());
    }

    #[tokio::test]
    async fn test_iteration_limit_forces_blocked() {
        let task = Task::new("T", "d", Role::Coder).with_max_iterations(2);
        let id = task.id;
        let registry = registry_with(vec![task]).await;

        // Two iterations are within bounds
        for _ in 0..2 {
            let t = registry.transition(id, "iteration", None, None).await.unwrap();
            assert_eq!(t.state, TaskState::Iteration);
            registry
                .transition(id, "implementing", None, None)
                .await
                .unwrap();
        }

        // Third crosses the bound: blocked plus a blocker naming the limit
        let t = registry.transition(id, "iteration", None, None).await.unwrap();
        assert_eq!(t.state, TaskState::Blocked);
        assert_eq!(t.iteration_count, 3);
        assert!(t.blockers.iter().any(|b| b.contains("Maximum iterations (2)")));
    }

    #[tokio::test]
    async fn test_nonempty_blockers_force_blocked() {
        let task = Task::new("T", "d", Role::Coder);
        let id = task.id;
        let registry = registry_with(vec![task]).await;

        registry.add_blocker(id, "missing credentials").await.unwrap();

        // Transition request is overridden while blockers remain
        let t = registry.transition(id, "testing", None, None).await.unwrap();
        assert_eq!(t.state, TaskState::Blocked);

        // Clearing the blocker restores the requested state, not `new`
        let t = registry.remove_blocker(id, 0).await.unwrap();
        assert_eq!(t.state, TaskState::Testing);
    }

    #[tokio::test]
    async fn test_remove_blocker_bad_index() {
        let task = Task::new("T", "d", Role::Coder);
        let id = task.id;
        let registry = registry_with(vec![task]).await;

        let err = registry.remove_blocker(id, 5).await.unwrap_err();
        assert!(matches!(err, CoordinationError::ValidationFailed(_)));
    }

    #[tokio::test]
    async fn test_quality_gate_does_not_transition() {
        let task = Task::new("T", "d", Role::Coder);
        let id = task.id;
        let registry = registry_with(vec![task]).await;

        registry.transition(id, "testing", None, None).await.unwrap();
        let t = registry.set_quality_gate(id, "tests_passing", true).await.unwrap();
        assert_eq!(t.state, TaskState::Testing);
        assert_eq!(t.quality_gates.get("tests_passing"), Some(&true));
    }

    #[tokio::test]
    async fn test_complete_accepted_without_gates() {
        // Permissive by design: the state machine does not enforce gates
        let task = Task::new("T", "d", Role::Coder);
        let id = task.id;
        let registry = registry_with(vec![task]).await;

        let t = registry.transition(id, "complete", None, None).await.unwrap();
        assert_eq!(t.state, TaskState::Complete);
        assert!(!t.all_gates_passed());
    }

    #[tokio::test]
    async fn test_ready_tasks_exclude_blocked_and_terminal() {
        let a = Task::new("A", "d", Role::Coder);
        let b = Task::new("B", "d", Role::Coder).with_dependency(a.id);
        let c = Task::new("C", "d", Role::Coder);
        let (a_id, b_id, c_id) = (a.id, b.id, c.id);
        let registry = registry_with(vec![a, b, c]).await;

        // B waits on A; A and C are ready
        let ready: Vec<Uuid> = registry.ready_tasks().await.iter().map(|t| t.id).collect();
        assert!(ready.contains(&a_id));
        assert!(ready.contains(&c_id));
        assert!(!ready.contains(&b_id));

        // A completes -> B becomes ready; blocked C drops out
        registry.transition(a_id, "complete", None, None).await.unwrap();
        registry.add_blocker(c_id, "stuck").await.unwrap();

        let ready: Vec<Uuid> = registry.ready_tasks().await.iter().map(|t| t.id).collect();
        assert_eq!(ready, vec![b_id]);
    }

    #[tokio::test]
    async fn test_ready_tasks_priority_order() {
        let low = Task::new("low", "d", Role::Coder).with_priority(TaskPriority::Low);
        let critical = Task::new("crit", "d", Role::Coder).with_priority(TaskPriority::Critical);
        let (low_id, crit_id) = (low.id, critical.id);
        let registry = registry_with(vec![low, critical]).await;

        let ready: Vec<Uuid> = registry.ready_tasks().await.iter().map(|t| t.id).collect();
        assert_eq!(ready, vec![crit_id, low_id]);
    }

    #[tokio::test]
    async fn test_subtask_links_parent() {
        let parent = Task::new("P", "d", Role::Coordinator);
        let parent_id = parent.id;
        let registry = registry_with(vec![parent]).await;

        let child = Task::new("C", "d", Role::Coder).with_parent(parent_id);
        let child_id = registry.insert(child).await.unwrap();

        let parent = registry.get(parent_id).await.unwrap();
        assert_eq!(parent.subtasks, vec![child_id]);

        // Grouping only: the child declares no dependency on the parent
        let child = registry.get(child_id).await.unwrap();
        assert!(child.dependencies.is_empty());

        let tree = registry.task_tree(parent_id).await.unwrap();
        assert_eq!(tree.node_count(), 2);
        assert_eq!(tree.subtasks[0].task_id, child_id);
    }

    #[tokio::test]
    async fn test_subtask_unknown_parent_rejected() {
        let registry = TaskRegistry::new();
        let child = Task::new("C", "d", Role::Coder).with_parent(Uuid::new_v4());
        let err = registry.insert(child).await.unwrap_err();
        assert!(matches!(err, CoordinationError::TaskNotFound(_)));
    }

    #[tokio::test]
    async fn test_add_dependency_rejects_cycle() {
        let a = Task::new("A", "d", Role::Coder);
        let b = Task::new("B", "d", Role::Coder).with_dependency(a.id);
        let (a_id, b_id) = (a.id, b.id);
        let registry = registry_with(vec![a, b]).await;

        let err = registry.add_dependency(a_id, b_id).await.unwrap_err();
        assert!(matches!(err, CoordinationError::DependencyCycle(_)));

        let err = registry.add_dependency(a_id, a_id).await.unwrap_err();
        assert!(matches!(err, CoordinationError::ValidationFailed(_)));
    }

    #[tokio::test]
    async fn test_insert_rejects_cycle() {
        let a = Task::new("A", "d", Role::Coder);
        let a_id = a.id;
        let registry = registry_with(vec![a]).await;

        // New task depending on A is fine; but wiring A back onto it must fail
        let b = Task::new("B", "d", Role::Coder).with_dependency(a_id);
        let b_id = registry.insert(b).await.unwrap();
        let err = registry.add_dependency(a_id, b_id).await.unwrap_err();
        assert!(matches!(err, CoordinationError::DependencyCycle(_)));
    }

    #[tokio::test]
    async fn test_team_status_counts() {
        let a = Task::new("A", "d", Role::Architect);
        let b = Task::new("B", "d", Role::Coder).with_priority(TaskPriority::High);
        let c = Task::new("C", "d", Role::Coder).with_parallel_group("wave-1");
        let (a_id, b_id) = (a.id, b.id);
        let registry = registry_with(vec![a, b, c]).await;

        registry.transition(a_id, "complete", None, None).await.unwrap();
        registry.transition(b_id, "implementing", None, None).await.unwrap();

        let status = registry.team_status().await;
        assert_eq!(status.total_tasks, 3);
        assert_eq!(status.completed_tasks, 1);
        assert_eq!(status.in_progress, 1);
        assert_eq!(status.by_state.get("complete"), Some(&1));
        assert_eq!(status.by_assignee.get("coder"), Some(&2));
        assert_eq!(status.by_priority.get("high"), Some(&1));
        assert_eq!(status.parallel_groups, 1);
        assert_eq!(status.active_blockers, 0);
    }

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let a = Task::new("A", "d", Role::Coder);
        let a_id = a.id;
        let registry = registry_with(vec![a]).await;
        registry.transition(a_id, "implementing", None, None).await.unwrap();

        let snapshot = registry.snapshot().await;
        assert_eq!(snapshot.tasks.len(), 1);

        let restored = TaskRegistry::new();
        restored.restore(snapshot).await;
        let task = restored.get(a_id).await.unwrap();
        assert_eq!(task.state, TaskState::Implementing);
    }
}
