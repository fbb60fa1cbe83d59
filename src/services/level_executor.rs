//! Bounded executor for level-ordered task execution.
//!
//! Runs the level scheduler's plan strictly in order. Within a level every
//! task runs, never more than the configured cap concurrently. The cap
//! bounds simultaneity only; it never truncates the executed set. Failure of
//! one task does not abort its siblings, but tasks depending on a failed
//! predecessor are reported as permanently unstartable rather than silently
//! skipped.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock, Semaphore};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::errors::{CoordinationError, CoordinationResult};
use crate::domain::models::TaskState;
use crate::domain::ports::TaskRunner;
use crate::services::level_scheduler::{SchedulePlan, UnscheduledTask};
use crate::services::registry::TaskRegistry;

/// Configuration for the level executor.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum concurrent task executions within a level.
    pub max_parallel_tasks: usize,
    /// Tasks whose quality gates are validated after the run.
    pub gate_tasks: Vec<Uuid>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_parallel_tasks: 3,
            gate_tasks: Vec::new(),
        }
    }
}

/// Status of an execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStatus {
    /// Not started.
    Pending,
    /// Currently running.
    Running,
    /// All tasks completed.
    Completed,
    /// Completed with some failures.
    PartialSuccess,
    /// No task completed.
    Failed,
    /// Cancelled before the plan drained.
    Cancelled,
}

/// Final disposition of a single task in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunDisposition {
    /// Runner reported success; task is complete.
    Completed,
    /// Runner reported failure; task carries the failed terminal marker.
    Failed,
    /// Cancellation was acknowledged before the task was admitted.
    Cancelled,
    /// A predecessor did not complete; the task can never start.
    Unstartable,
}

/// Per-task result of an execution run.
#[derive(Debug, Clone)]
pub struct TaskRunResult {
    pub task_id: Uuid,
    pub disposition: RunDisposition,
    pub error: Option<String>,
    pub duration_ms: u64,
}

/// Quality-gate validation outcome for a designated gate task.
#[derive(Debug, Clone)]
pub struct GateValidation {
    pub valid: bool,
    pub reason: Option<String>,
    pub gates: HashMap<String, bool>,
}

/// Event emitted during execution.
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    /// Execution started.
    Started { total_tasks: usize, level_count: usize },
    /// Level started.
    LevelStarted { level: usize, task_count: usize },
    /// Task admitted to a runner.
    TaskStarted { task_id: Uuid, title: String },
    /// Task completed.
    TaskCompleted { task_id: Uuid },
    /// Task failed.
    TaskFailed { task_id: Uuid, error: String },
    /// Level drained.
    LevelCompleted { level: usize, succeeded: usize, failed: usize },
    /// Execution finished.
    Completed { status: ExecutionStatus },
}

/// Summary of an execution run.
#[derive(Debug, Clone, Default)]
pub struct ExecutionReport {
    /// True only when every task completed and the plan was fully scheduled
    pub success: bool,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub failed_tasks: usize,
    pub cancelled_tasks: usize,
    pub unstartable_tasks: usize,
    pub total_duration_ms: u64,
    /// Per-task outcomes, in admission order
    pub task_results: Vec<TaskRunResult>,
    /// Per-task errors (failed and unstartable tasks)
    pub errors: Vec<(Uuid, String)>,
    /// Tasks the scheduler could not place in any level
    pub unscheduled: Vec<UnscheduledTask>,
    /// Gate validation for designated gate tasks
    pub quality_gate_results: HashMap<Uuid, GateValidation>,
}

impl ExecutionReport {
    /// Roll the counts up into a status.
    pub fn status(&self) -> ExecutionStatus {
        if self.cancelled_tasks > 0 {
            ExecutionStatus::Cancelled
        } else if self.failed_tasks == 0 && self.unstartable_tasks == 0 {
            ExecutionStatus::Completed
        } else if self.completed_tasks > 0 {
            ExecutionStatus::PartialSuccess
        } else {
            ExecutionStatus::Failed
        }
    }
}

/// Executes a schedule plan against the task registry.
pub struct LevelExecutor {
    registry: Arc<TaskRegistry>,
    runner: Arc<dyn TaskRunner>,
    config: ExecutorConfig,
    status: Arc<RwLock<ExecutionStatus>>,
}

impl LevelExecutor {
    pub fn new(
        registry: Arc<TaskRegistry>,
        runner: Arc<dyn TaskRunner>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            registry,
            runner,
            config,
            status: Arc::new(RwLock::new(ExecutionStatus::Pending)),
        }
    }

    /// Current execution status.
    pub async fn status(&self) -> ExecutionStatus {
        self.status.read().await.clone()
    }

    /// Stop admitting new tasks. In-flight tasks finish normally;
    /// never-admitted tasks receive a distinct cancelled outcome.
    pub async fn cancel(&self) {
        let mut status = self.status.write().await;
        *status = ExecutionStatus::Cancelled;
        info!("execution cancelled; no further tasks will be admitted");
    }

    /// Execute a plan without observing events.
    pub async fn execute(&self, plan: &SchedulePlan) -> CoordinationResult<ExecutionReport> {
        let (tx, _rx) = mpsc::channel(100);
        self.execute_with_events(plan, tx).await
    }

    /// Execute a plan, streaming progress events.
    #[instrument(skip(self, plan, event_tx), fields(levels = plan.total_levels()))]
    pub async fn execute_with_events(
        &self,
        plan: &SchedulePlan,
        event_tx: mpsc::Sender<ExecutionEvent>,
    ) -> CoordinationResult<ExecutionReport> {
        plan.validate().map_err(CoordinationError::ValidationFailed)?;

        let start = std::time::Instant::now();
        {
            let mut status = self.status.write().await;
            if *status != ExecutionStatus::Cancelled {
                *status = ExecutionStatus::Running;
            }
        }

        let total_tasks = plan.scheduled_tasks() + plan.unscheduled.len();
        let _ = event_tx
            .send(ExecutionEvent::Started {
                total_tasks,
                level_count: plan.total_levels(),
            })
            .await;

        // Dependencies resolved by something other than this run: tasks
        // already complete before execution begins.
        let mut satisfied: HashSet<Uuid> = self
            .registry
            .list()
            .await
            .iter()
            .filter(|t| t.state == TaskState::Complete)
            .map(|t| t.id)
            .collect();

        let mut report = ExecutionReport {
            total_tasks,
            unscheduled: plan.unscheduled.clone(),
            ..ExecutionReport::default()
        };

        for level in &plan.levels {
            let _ = event_tx
                .send(ExecutionEvent::LevelStarted {
                    level: level.level,
                    task_count: level.task_count(),
                })
                .await;

            let level_results = self
                .execute_level(&level.task_ids, &satisfied, &event_tx)
                .await;

            let mut succeeded = 0;
            let mut failed = 0;
            for result in level_results {
                match result.disposition {
                    RunDisposition::Completed => {
                        satisfied.insert(result.task_id);
                        report.completed_tasks += 1;
                        succeeded += 1;
                    }
                    RunDisposition::Failed => {
                        report.failed_tasks += 1;
                        failed += 1;
                    }
                    RunDisposition::Cancelled => {
                        report.cancelled_tasks += 1;
                    }
                    RunDisposition::Unstartable => {
                        report.unstartable_tasks += 1;
                    }
                }
                if let Some(error) = &result.error {
                    report.errors.push((result.task_id, error.clone()));
                }
                report.task_results.push(result);
            }

            let _ = event_tx
                .send(ExecutionEvent::LevelCompleted {
                    level: level.level,
                    succeeded,
                    failed,
                })
                .await;
        }

        // A run with unscheduled tasks can never be an overall success.
        report.success = report.failed_tasks == 0
            && report.cancelled_tasks == 0
            && report.unstartable_tasks == 0
            && plan.is_fully_scheduled();
        report.total_duration_ms =
            u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        for &gate_task in &self.config.gate_tasks {
            let validation = self.validate_quality_gate(gate_task).await;
            report.quality_gate_results.insert(gate_task, validation);
        }

        let final_status = report.status();
        {
            let mut status = self.status.write().await;
            // A cancel acknowledged mid-run wins over the rollup.
            if *status != ExecutionStatus::Cancelled || final_status == ExecutionStatus::Cancelled {
                *status = final_status.clone();
            }
        }

        let _ = event_tx
            .send(ExecutionEvent::Completed {
                status: final_status,
            })
            .await;

        info!(
            total = report.total_tasks,
            completed = report.completed_tasks,
            failed = report.failed_tasks,
            cancelled = report.cancelled_tasks,
            unstartable = report.unstartable_tasks,
            unscheduled = report.unscheduled.len(),
            "execution finished"
        );

        Ok(report)
    }

    /// Run every task of one level, bounded by the concurrency cap.
    async fn execute_level(
        &self,
        task_ids: &[Uuid],
        satisfied: &HashSet<Uuid>,
        event_tx: &mpsc::Sender<ExecutionEvent>,
    ) -> Vec<TaskRunResult> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_parallel_tasks.max(1)));
        let mut handles = Vec::new();
        let mut immediate = Vec::new();

        for &task_id in task_ids {
            if *self.status.read().await == ExecutionStatus::Cancelled {
                let _ = self.registry.record_run_cancelled(task_id).await;
                immediate.push(TaskRunResult {
                    task_id,
                    disposition: RunDisposition::Cancelled,
                    error: None,
                    duration_ms: 0,
                });
                continue;
            }

            let Some(task) = self.registry.get(task_id).await else {
                immediate.push(TaskRunResult {
                    task_id,
                    disposition: RunDisposition::Failed,
                    error: Some("Task not found".to_string()),
                    duration_ms: 0,
                });
                continue;
            };

            // Already satisfied before this run
            if task.state == TaskState::Complete {
                immediate.push(TaskRunResult {
                    task_id,
                    disposition: RunDisposition::Completed,
                    error: None,
                    duration_ms: 0,
                });
                continue;
            }

            // A predecessor failed, was cancelled, or never started: the
            // dependency contract can never be met. Unknown dependency ids
            // are externally satisfied.
            let mut broken_dep = None;
            for &dep in &task.dependencies {
                if !satisfied.contains(&dep) && self.registry.get(dep).await.is_some() {
                    broken_dep = Some(dep);
                    break;
                }
            }
            if let Some(dep) = broken_dep {
                let error = format!("Dependency {dep} did not complete");
                warn!(task_id = %task_id, %error, "task is permanently unstartable");
                immediate.push(TaskRunResult {
                    task_id,
                    disposition: RunDisposition::Unstartable,
                    error: Some(error),
                    duration_ms: 0,
                });
                continue;
            }

            // Gating: a blocked task cannot be admitted.
            if task.state == TaskState::Blocked {
                let error = format!("Task is blocked: {}", task.blockers.join("; "));
                immediate.push(TaskRunResult {
                    task_id,
                    disposition: RunDisposition::Unstartable,
                    error: Some(error),
                    duration_ms: 0,
                });
                continue;
            }

            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                immediate.push(TaskRunResult {
                    task_id,
                    disposition: RunDisposition::Failed,
                    error: Some("Executor semaphore closed".to_string()),
                    duration_ms: 0,
                });
                continue;
            };

            // Re-check after waiting for a slot: a cancel acknowledged while
            // queued means this task was never admitted.
            if *self.status.read().await == ExecutionStatus::Cancelled {
                drop(permit);
                let _ = self.registry.record_run_cancelled(task_id).await;
                immediate.push(TaskRunResult {
                    task_id,
                    disposition: RunDisposition::Cancelled,
                    error: None,
                    duration_ms: 0,
                });
                continue;
            }

            let registry = self.registry.clone();
            let runner = self.runner.clone();
            let event_tx = event_tx.clone();
            let _ = event_tx
                .send(ExecutionEvent::TaskStarted {
                    task_id,
                    title: task.title.clone(),
                })
                .await;

            let handle = tokio::spawn(async move {
                let _permit = permit;
                let start = std::time::Instant::now();
                let outcome = runner.run(&task).await;
                let duration_ms =
                    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

                if outcome.success {
                    let _ = registry.record_run_success(task_id, outcome.outputs).await;
                    let _ = event_tx.send(ExecutionEvent::TaskCompleted { task_id }).await;
                    TaskRunResult {
                        task_id,
                        disposition: RunDisposition::Completed,
                        error: None,
                        duration_ms,
                    }
                } else {
                    let error = outcome
                        .error
                        .unwrap_or_else(|| "Unknown error".to_string());
                    let _ = registry.record_run_failure(task_id).await;
                    let _ = event_tx
                        .send(ExecutionEvent::TaskFailed {
                            task_id,
                            error: error.clone(),
                        })
                        .await;
                    TaskRunResult {
                        task_id,
                        disposition: RunDisposition::Failed,
                        error: Some(error),
                        duration_ms,
                    }
                }
            });
            handles.push(handle);
        }

        let mut results = immediate;
        for joined in futures::future::join_all(handles).await {
            if let Ok(result) = joined {
                results.push(result);
            }
        }
        results
    }

    /// Validate the quality gates of a designated gate task.
    async fn validate_quality_gate(&self, task_id: Uuid) -> GateValidation {
        let Some(task) = self.registry.get(task_id).await else {
            return GateValidation {
                valid: false,
                reason: Some("Task not found".to_string()),
                gates: HashMap::new(),
            };
        };

        if task.state != TaskState::Complete {
            return GateValidation {
                valid: false,
                reason: Some("Task was not completed successfully".to_string()),
                gates: task.quality_gates.clone(),
            };
        }

        let valid = task.all_gates_passed();
        GateValidation {
            valid,
            reason: (!valid).then(|| "Not all quality gates passed".to_string()),
            gates: task.quality_gates.clone(),
        }
    }
}
