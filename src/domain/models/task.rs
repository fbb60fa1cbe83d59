//! Task domain model.
//!
//! Tasks are discrete units of work that move through a fixed pipeline of
//! specialist roles. They form a DAG via declared dependencies.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a task in the role pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Task is defined but work has not started
    New,
    /// Requirements analysis in progress
    Analyzing,
    /// Solution design in progress
    Planning,
    /// Active implementation
    Implementing,
    /// Under review
    Reviewing,
    /// Under test
    Testing,
    /// Rework cycle after review/test findings
    Iteration,
    /// Held by one or more blockers
    Blocked,
    /// Finished successfully
    Complete,
    /// Execution failed
    Failed,
    /// Execution was cancelled before the task was admitted
    Cancelled,
}

impl Default for TaskState {
    fn default() -> Self {
        Self::New
    }
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Analyzing => "analyzing",
            Self::Planning => "planning",
            Self::Implementing => "implementing",
            Self::Reviewing => "reviewing",
            Self::Testing => "testing",
            Self::Iteration => "iteration",
            Self::Blocked => "blocked",
            Self::Complete => "complete",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "new" => Some(Self::New),
            "analyzing" => Some(Self::Analyzing),
            "planning" => Some(Self::Planning),
            "implementing" => Some(Self::Implementing),
            "reviewing" => Some(Self::Reviewing),
            "testing" => Some(Self::Testing),
            "iteration" => Some(Self::Iteration),
            "blocked" => Some(Self::Blocked),
            "complete" | "completed" => Some(Self::Complete),
            "failed" => Some(Self::Failed),
            "cancelled" | "canceled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed | Self::Cancelled)
    }

    /// Check if this is an active (non-terminal) state.
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Specialist roles that can own a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Architect,
    Coder,
    PrReviewer,
    QaTester,
    Coordinator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Architect => "architect",
            Self::Coder => "coder",
            Self::PrReviewer => "pr_reviewer",
            Self::QaTester => "qa_tester",
            Self::Coordinator => "coordinator",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "architect" => Some(Self::Architect),
            "coder" => Some(Self::Coder),
            "pr_reviewer" => Some(Self::PrReviewer),
            "qa_tester" => Some(Self::QaTester),
            "coordinator" => Some(Self::Coordinator),
            _ => None,
        }
    }

    /// Initial pipeline state for a task first assigned to this role.
    pub fn initial_state(&self) -> TaskState {
        match self {
            Self::Architect => TaskState::Analyzing,
            _ => TaskState::New,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priority level for tasks. Orders admission within a level; never
/// influences dependency resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low = 1,
    Medium = 2,
    High = 3,
    Critical = 4,
}

impl Default for TaskPriority {
    fn default() -> Self {
        Self::Medium
    }
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

/// Opaque key-value context attached to a task.
///
/// Interpreted only by external collaborators; the core never inspects
/// the contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskContext {
    #[serde(flatten)]
    pub values: HashMap<String, serde_json::Value>,
}

impl TaskContext {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Merge another context into this one, overwriting duplicate keys.
    pub fn merge(&mut self, other: TaskContext) {
        self.values.extend(other.values);
    }
}

/// Append-only record of a responsibility transfer between roles.
///
/// Owned exclusively by the task it belongs to; never mutated after
/// creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandoffRecord {
    pub from_role: Role,
    pub to_role: Role,
    pub timestamp: DateTime<Utc>,
    /// Pipeline state at the moment of the handoff (pre-transition).
    pub state_at_handoff: TaskState,
    /// Copy of the task context at the moment of the handoff.
    pub context_snapshot: TaskContext,
    pub notes: String,
}

/// Default quality gate set for a newly created task.
fn default_quality_gates() -> HashMap<String, bool> {
    [
        "architecture_approved",
        "tests_passing",
        "review_approved",
        "qa_validated",
    ]
    .iter()
    .map(|gate| ((*gate).to_string(), false))
    .collect()
}

const fn default_max_iterations() -> u32 {
    3
}

/// A unit of work owned by exactly one role at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier, assigned at creation and never reused
    pub id: Uuid,
    /// Human-readable title
    pub title: String,
    /// Detailed description; opaque to the core
    pub description: String,
    /// Role currently responsible; changes only via a recorded handoff
    pub assignee: Role,
    /// Current lifecycle state
    pub state: TaskState,
    /// Admission tie-break priority
    pub priority: TaskPriority,
    /// Task IDs that must be complete before this task may start
    pub dependencies: Vec<Uuid>,
    /// Parent task (grouping only, no implied dependency)
    pub parent_task: Option<Uuid>,
    /// Subtask ids (grouping only)
    pub subtasks: Vec<Uuid>,
    /// Advisory grouping label, distinct from scheduler level numbers
    pub parallel_group: Option<String>,
    /// Opaque execution context
    pub context: TaskContext,
    /// Append-only handoff history
    pub handoffs: Vec<HandoffRecord>,
    /// Ordered free-text obstructions; non-empty forces `Blocked`
    pub blockers: Vec<String>,
    /// Free-text deliverable records
    pub deliverables: Vec<String>,
    /// Count of entries into the iteration state
    pub iteration_count: u32,
    /// Rework bound; exceeding it produces a blocker
    pub max_iterations: u32,
    /// Named boolean checkpoints, reporting only
    pub quality_gates: HashMap<String, bool>,
    /// Opaque outputs recorded on completion
    pub outputs: HashMap<String, serde_json::Value>,
    /// State to restore when the last blocker is cleared
    pub resume_state: TaskState,
    /// When created
    pub created_at: DateTime<Utc>,
    /// When last updated
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a new task assigned to a role. The initial state is derived
    /// from the role (`analyzing` for the architect, `new` otherwise).
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        assignee: Role,
    ) -> Self {
        let now = Utc::now();
        let state = assignee.initial_state();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: description.into(),
            assignee,
            state,
            priority: TaskPriority::default(),
            dependencies: Vec::new(),
            parent_task: None,
            subtasks: Vec::new(),
            parallel_group: None,
            context: TaskContext::default(),
            handoffs: Vec::new(),
            blockers: Vec::new(),
            deliverables: Vec::new(),
            iteration_count: 0,
            max_iterations: default_max_iterations(),
            quality_gates: default_quality_gates(),
            outputs: HashMap::new(),
            resume_state: state,
            created_at: now,
            updated_at: now,
        }
    }

    /// Add a dependency. Self-dependencies and duplicates are ignored.
    pub fn with_dependency(mut self, task_id: Uuid) -> Self {
        if !self.dependencies.contains(&task_id) && task_id != self.id {
            self.dependencies.push(task_id);
        }
        self
    }

    /// Set priority.
    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Set parent task.
    pub fn with_parent(mut self, parent_id: Uuid) -> Self {
        self.parent_task = Some(parent_id);
        self
    }

    /// Set the advisory parallel group label.
    pub fn with_parallel_group(mut self, group: impl Into<String>) -> Self {
        self.parallel_group = Some(group.into());
        self
    }

    /// Set the rework bound.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    /// Set the initial context.
    pub fn with_context(mut self, context: TaskContext) -> Self {
        self.context = context;
        self
    }

    /// Validate task invariants.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Task title cannot be empty".to_string());
        }
        if self.dependencies.contains(&self.id) {
            return Err("Task cannot depend on itself".to_string());
        }
        Ok(())
    }

    /// Check if the task is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Check whether every declared dependency is in the given completed set.
    pub fn dependencies_met(&self, completed: &HashSet<Uuid>) -> bool {
        self.dependencies.iter().all(|dep| completed.contains(dep))
    }

    /// Record a handoff to a new role, capturing the pre-transition state
    /// and a snapshot of the current context.
    pub fn record_handoff(&mut self, to_role: Role, notes: impl Into<String>) {
        let record = HandoffRecord {
            from_role: self.assignee,
            to_role,
            timestamp: Utc::now(),
            state_at_handoff: self.state,
            context_snapshot: self.context.clone(),
            notes: notes.into(),
        };
        self.handoffs.push(record);
        self.assignee = to_role;
    }

    /// Append a blocker and force the task into `Blocked`.
    ///
    /// The current state is remembered as the resume target unless the task
    /// is already blocked.
    pub fn add_blocker(&mut self, reason: impl Into<String>) {
        if self.state != TaskState::Blocked {
            self.resume_state = self.state;
        }
        self.blockers.push(reason.into());
        self.state = TaskState::Blocked;
        self.updated_at = Utc::now();
    }

    /// Remove a blocker by index. When the last blocker is cleared the task
    /// returns to the state recorded before blocking.
    ///
    /// Returns `true` if a blocker was removed.
    pub fn remove_blocker(&mut self, index: usize) -> bool {
        if index >= self.blockers.len() {
            return false;
        }
        self.blockers.remove(index);
        if self.blockers.is_empty() && self.state == TaskState::Blocked {
            self.state = self.resume_state;
        }
        self.updated_at = Utc::now();
        true
    }

    /// Set a named quality gate. Never triggers a state transition.
    pub fn set_quality_gate(&mut self, gate: impl Into<String>, passed: bool) {
        self.quality_gates.insert(gate.into(), passed);
        self.updated_at = Utc::now();
    }

    /// Check if every declared quality gate has passed.
    pub fn all_gates_passed(&self) -> bool {
        !self.quality_gates.is_empty() && self.quality_gates.values().all(|passed| *passed)
    }
}
