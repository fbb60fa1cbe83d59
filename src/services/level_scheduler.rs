//! Level scheduler for maximal-concurrency execution groups.
//!
//! Organizes a task collection into ordered levels via dependency-count
//! reduction (Kahn-style leveling). Every task at level *k* depends only on
//! tasks at levels `< k`; tasks within a level are mutually independent.
//!
//! Tasks whose dependency count never reaches zero (cycle members and
//! everything transitively behind them) are returned in an explicit
//! `unscheduled` set with a diagnosable reason, never dropped.

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::domain::models::Task;
use crate::services::dependency_graph::DependencyGraph;

/// A level in the schedule containing tasks that can run in parallel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduleLevel {
    /// Level number (0-indexed, 0 = no dependencies)
    pub level: usize,
    /// Task ids admitted at this level, in priority tie-break order
    pub task_ids: Vec<Uuid>,
}

impl ScheduleLevel {
    pub fn new(level: usize, task_ids: Vec<Uuid>) -> Self {
        Self { level, task_ids }
    }

    pub fn task_count(&self) -> usize {
        self.task_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.task_ids.is_empty()
    }
}

/// Why a task could not be placed in any level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnscheduledReason {
    /// The task participates in a dependency cycle, or depends (possibly
    /// transitively) on a task that can never be satisfied.
    CycleOrUnsatisfiedDependency,
}

/// A task excluded from every level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnscheduledTask {
    pub task_id: Uuid,
    pub reason: UnscheduledReason,
}

/// Ordered sequence of execution levels plus the unschedulable remainder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulePlan {
    /// Levels in execution order
    pub levels: Vec<ScheduleLevel>,
    /// Tasks that could not be placed in any level
    pub unscheduled: Vec<UnscheduledTask>,
}

impl SchedulePlan {
    pub fn total_levels(&self) -> usize {
        self.levels.len()
    }

    /// Number of tasks placed into levels.
    pub fn scheduled_tasks(&self) -> usize {
        self.levels.iter().map(ScheduleLevel::task_count).sum()
    }

    /// True when every task was placed into a level.
    pub fn is_fully_scheduled(&self) -> bool {
        self.unscheduled.is_empty()
    }

    pub fn get_level(&self, level: usize) -> Option<&ScheduleLevel> {
        self.levels.get(level)
    }

    /// All scheduled task ids in level order.
    pub fn all_task_ids(&self) -> Vec<Uuid> {
        self.levels
            .iter()
            .flat_map(|level| level.task_ids.iter())
            .copied()
            .collect()
    }

    /// Level number for a scheduled task.
    pub fn level_of(&self, task_id: Uuid) -> Option<usize> {
        self.levels
            .iter()
            .find(|level| level.task_ids.contains(&task_id))
            .map(|level| level.level)
    }

    /// Validate structural invariants: sequential level numbers, no empty
    /// levels, no task appearing twice.
    pub fn validate(&self) -> Result<(), String> {
        for (idx, level) in self.levels.iter().enumerate() {
            if level.level != idx {
                return Err(format!(
                    "Level {} has incorrect level number {}",
                    idx, level.level
                ));
            }
            if level.is_empty() {
                return Err(format!("Level {idx} is empty"));
            }
        }

        let mut seen = HashSet::new();
        for id in self.all_task_ids() {
            if !seen.insert(id) {
                return Err(format!("Duplicate task ID found: {id}"));
            }
        }

        Ok(())
    }
}

/// Computes execution levels from a task collection.
#[derive(Debug, Clone, Default)]
pub struct LevelScheduler;

impl LevelScheduler {
    pub fn new() -> Self {
        Self
    }

    /// Compute the schedule plan for a task collection.
    ///
    /// Re-running after a dependency change is safe: the plan is a fresh
    /// value each time, so no stale level assignment survives.
    #[instrument(skip(self, tasks), fields(task_count = tasks.len()))]
    pub fn plan(&self, tasks: &[Task]) -> SchedulePlan {
        let graph = DependencyGraph::build(tasks);
        let by_id: HashMap<Uuid, &Task> = tasks.iter().map(|t| (t.id, t)).collect();
        let mut in_degree = graph.in_degrees();

        let mut current: Vec<Uuid> = in_degree
            .iter()
            .filter(|&(_, &degree)| degree == 0)
            .map(|(&id, _)| id)
            .collect();
        sort_for_admission(&mut current, &by_id);

        let mut levels = Vec::new();
        let mut scheduled: HashSet<Uuid> = HashSet::new();

        while !current.is_empty() {
            scheduled.extend(current.iter().copied());

            let mut next = Vec::new();
            for &task_id in &current {
                for &successor in graph.successors(task_id) {
                    if let Some(degree) = in_degree.get_mut(&successor) {
                        *degree -= 1;
                        if *degree == 0 {
                            next.push(successor);
                        }
                    }
                }
            }
            sort_for_admission(&mut next, &by_id);

            levels.push(ScheduleLevel::new(levels.len(), std::mem::take(&mut current)));
            current = next;
        }

        // Anything never reaching in-degree zero is a cycle member or sits
        // behind one; surface it instead of dropping it.
        let mut leftover: Vec<Uuid> = graph
            .node_ids()
            .filter(|id| !scheduled.contains(id))
            .collect();
        sort_for_admission(&mut leftover, &by_id);

        if !leftover.is_empty() {
            warn!(
                unscheduled = leftover.len(),
                "tasks excluded from every level (cycle or unsatisfiable dependency)"
            );
        }
        debug!(levels = levels.len(), scheduled = scheduled.len(), "schedule plan built");

        SchedulePlan {
            levels,
            unscheduled: leftover
                .into_iter()
                .map(|task_id| UnscheduledTask {
                    task_id,
                    reason: UnscheduledReason::CycleOrUnsatisfiedDependency,
                })
                .collect(),
        }
    }
}

/// Order task ids for admission: priority (highest first), then creation
/// time, then id as a final deterministic tie-break.
fn sort_for_admission(ids: &mut [Uuid], by_id: &HashMap<Uuid, &Task>) {
    ids.sort_by(|a, b| match (by_id.get(a), by_id.get(b)) {
        (Some(ta), Some(tb)) => (Reverse(ta.priority), ta.created_at, ta.id)
            .cmp(&(Reverse(tb.priority), tb.created_at, tb.id)),
        _ => a.cmp(b),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Role, Task, TaskPriority};

    fn task(deps: Vec<Uuid>) -> Task {
        let mut t = Task::new("Test", "Description", Role::Coder);
        t.dependencies = deps;
        t
    }

    #[test]
    fn test_fan_out_levels() {
        // A (no deps), B (dep A), C (dep A) -> [A], [B, C]
        let a = task(vec![]);
        let b = task(vec![a.id]);
        let c = task(vec![a.id]);

        let plan = LevelScheduler::new().plan(&[a.clone(), b.clone(), c.clone()]);

        assert_eq!(plan.total_levels(), 2);
        assert_eq!(plan.levels[0].task_ids, vec![a.id]);
        assert_eq!(plan.levels[1].task_count(), 2);
        assert!(plan.levels[1].task_ids.contains(&b.id));
        assert!(plan.levels[1].task_ids.contains(&c.id));
        assert!(plan.is_fully_scheduled());
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn test_cycle_reported_not_dropped() {
        // X <-> Y: zero levels, both unscheduled with a reason
        let mut x = task(vec![]);
        let mut y = task(vec![]);
        x.dependencies = vec![y.id];
        y.dependencies = vec![x.id];

        let plan = LevelScheduler::new().plan(&[x.clone(), y.clone()]);

        assert_eq!(plan.total_levels(), 0);
        assert_eq!(plan.unscheduled.len(), 2);
        for entry in &plan.unscheduled {
            assert_eq!(entry.reason, UnscheduledReason::CycleOrUnsatisfiedDependency);
        }
        let ids: Vec<Uuid> = plan.unscheduled.iter().map(|u| u.task_id).collect();
        assert!(ids.contains(&x.id));
        assert!(ids.contains(&y.id));
    }

    #[test]
    fn test_tasks_behind_cycle_are_unscheduled() {
        let mut x = task(vec![]);
        let mut y = task(vec![]);
        x.dependencies = vec![y.id];
        y.dependencies = vec![x.id];
        let z = task(vec![x.id]); // depends on a cycle member

        let plan = LevelScheduler::new().plan(&[x, y, z.clone()]);

        assert_eq!(plan.total_levels(), 0);
        assert_eq!(plan.unscheduled.len(), 3);
        assert!(plan.unscheduled.iter().any(|u| u.task_id == z.id));
    }

    #[test]
    fn test_levels_depend_only_on_earlier_levels() {
        let a = task(vec![]);
        let b = task(vec![a.id]);
        let c = task(vec![a.id, b.id]);
        let d = task(vec![]);
        let tasks = vec![a, b, c, d];

        let plan = LevelScheduler::new().plan(&tasks);
        assert!(plan.is_fully_scheduled());

        for t in &tasks {
            let level = plan.level_of(t.id).expect("scheduled");
            for dep in &t.dependencies {
                let dep_level = plan.level_of(*dep).expect("dep scheduled");
                assert!(dep_level < level, "dependency must sit in an earlier level");
            }
        }
    }

    #[test]
    fn test_plan_is_order_stable() {
        let a = task(vec![]);
        let b = task(vec![a.id]);
        let c = task(vec![a.id]);
        let tasks = vec![c.clone(), a.clone(), b.clone()];

        let first = LevelScheduler::new().plan(&tasks);
        let second = LevelScheduler::new().plan(&tasks);

        assert_eq!(first.levels, second.levels);
        assert_eq!(first.unscheduled, second.unscheduled);
    }

    #[test]
    fn test_priority_orders_admission_within_level() {
        let low = task(vec![]).with_priority(TaskPriority::Low);
        let critical = task(vec![]).with_priority(TaskPriority::Critical);
        let medium = task(vec![]).with_priority(TaskPriority::Medium);

        let plan = LevelScheduler::new().plan(&[low.clone(), critical.clone(), medium.clone()]);

        assert_eq!(plan.total_levels(), 1);
        assert_eq!(
            plan.levels[0].task_ids,
            vec![critical.id, medium.id, low.id]
        );
    }

    #[test]
    fn test_missing_dependency_does_not_block_leveling() {
        // Dependency on an id outside the collection: externally satisfied
        let a = task(vec![Uuid::new_v4()]);
        let plan = LevelScheduler::new().plan(&[a.clone()]);

        assert_eq!(plan.total_levels(), 1);
        assert_eq!(plan.levels[0].task_ids, vec![a.id]);
        assert!(plan.is_fully_scheduled());
    }

    #[test]
    fn test_rerun_after_dependency_change() {
        let a = task(vec![]);
        let mut b = task(vec![a.id]);

        let plan = LevelScheduler::new().plan(&[a.clone(), b.clone()]);
        assert_eq!(plan.level_of(b.id), Some(1));

        // Dependency removed: fresh plan, no stale level assignment
        b.dependencies.clear();
        let plan = LevelScheduler::new().plan(&[a.clone(), b.clone()]);
        assert_eq!(plan.level_of(b.id), Some(0));
        assert_eq!(plan.total_levels(), 1);
    }

    #[test]
    fn test_empty_collection() {
        let plan = LevelScheduler::new().plan(&[]);
        assert_eq!(plan.total_levels(), 0);
        assert!(plan.is_fully_scheduled());
        assert!(plan.validate().is_ok());
    }
}
