//! End-to-end coordination flow tests.
//!
//! Exercises the full pipeline: create tasks with dependencies, hand off
//! between roles, schedule into levels, execute with a bounded runner, and
//! persist/restore the collection through the snapshot store.

mod common;

use std::sync::Arc;

use foreman::adapters::runners::SimulatedRunner;
use foreman::adapters::storage::JsonSnapshotStore;
use foreman::domain::models::{Config, Role, Task, TaskPriority, TaskState};
use foreman::services::{Coordinator, RunDisposition};

use common::coder_task;

fn coordinator() -> Coordinator {
    Coordinator::new(Config::default())
}

#[tokio::test]
async fn full_pipeline_with_handoffs_and_execution() {
    let coord = coordinator();

    // Architect designs, coder implements on top of the design, QA verifies
    let design = coord
        .create_task(Task::new(
            "Design auth schema",
            "Tables and indexes for auth",
            Role::Architect,
        ))
        .await
        .unwrap();
    let implement = coord
        .create_task(
            Task::new("Implement login", "POST /login endpoint", Role::Coder)
                .with_dependency(design)
                .with_priority(TaskPriority::High),
        )
        .await
        .unwrap();
    let verify = coord
        .create_task(
            Task::new("QA login flow", "Happy path and lockout", Role::QaTester)
                .with_dependency(implement),
        )
        .await
        .unwrap();

    // The architect task starts in analyzing; hand it off to the coder
    let task = coord
        .transition(design, "planning", None, None)
        .await
        .unwrap();
    assert_eq!(task.state, TaskState::Planning);

    let task = coord
        .transition(design, "implementing", Some("coder"), Some("design approved"))
        .await
        .unwrap();
    assert_eq!(task.assignee, Role::Coder);
    assert_eq!(task.handoffs.len(), 1);
    assert_eq!(task.handoffs[0].state_at_handoff, TaskState::Planning);

    // Three levels: design -> implement -> verify
    let plan = coord.plan().await;
    assert_eq!(plan.total_levels(), 3);
    assert_eq!(plan.levels[0].task_ids, vec![design]);
    assert_eq!(plan.levels[1].task_ids, vec![implement]);
    assert_eq!(plan.levels[2].task_ids, vec![verify]);

    // Execute the whole pipeline with the simulated runner
    let report = coord
        .execute(Arc::new(SimulatedRunner::new()), vec![verify])
        .await
        .unwrap();
    assert!(report.success);
    assert_eq!(report.completed_tasks, 3);

    for id in [design, implement, verify] {
        assert_eq!(coord.get_task(id).await.unwrap().state, TaskState::Complete);
    }

    // Gate validation ran for the designated gate task; default gates are
    // still false, so the validation reports invalid without failing the run
    let validation = report.quality_gate_results.get(&verify).unwrap();
    assert!(!validation.valid);
    assert!(report.success);
}

#[tokio::test]
async fn diamond_executes_both_branches_under_cap_one() {
    let coord = coordinator();

    let a = coord.create_task(coder_task("A", &[])).await.unwrap();
    let b = coord.create_task(coder_task("B", &[a])).await.unwrap();
    let c = coord.create_task(coder_task("C", &[a])).await.unwrap();
    let d = coord.create_task(coder_task("D", &[b, c])).await.unwrap();

    let plan = coord.plan().await;
    assert_eq!(plan.total_levels(), 3);
    assert_eq!(plan.levels[1].task_count(), 2);

    // Cap of one: both middle tasks must still run before D
    let config = Config {
        max_parallel_tasks: 1,
        ..Config::default()
    };
    let coord_capped = Coordinator::new(config);
    for task in coord.list_tasks().await {
        // Re-create the same graph under the capped coordinator
        let mut fresh = coder_task(&task.title, &task.dependencies);
        fresh.id = task.id;
        coord_capped.create_task(fresh).await.unwrap();
    }

    let report = coord_capped
        .execute(Arc::new(SimulatedRunner::new()), Vec::new())
        .await
        .unwrap();
    assert!(report.success);
    assert_eq!(report.completed_tasks, 4);
    assert_eq!(
        coord_capped.get_task(d).await.unwrap().state,
        TaskState::Complete
    );
}

#[tokio::test]
async fn failed_predecessor_reports_unstartable_chain() {
    let coord = coordinator();

    let a = coord.create_task(coder_task("A", &[])).await.unwrap();
    let b = coord.create_task(coder_task("B", &[a])).await.unwrap();
    let c = coord.create_task(coder_task("C", &[b])).await.unwrap();

    let runner = SimulatedRunner::new();
    runner.fail_task(a, "segfault in codegen").await;

    let report = coord.execute(Arc::new(runner), Vec::new()).await.unwrap();
    assert!(!report.success);
    assert_eq!(report.failed_tasks, 1);
    assert_eq!(report.unstartable_tasks, 2);

    // The failed task never vanishes from the summary
    assert!(report.errors.iter().any(|(id, _)| *id == a));
    let b_result = report.task_results.iter().find(|r| r.task_id == b).unwrap();
    assert_eq!(b_result.disposition, RunDisposition::Unstartable);
    let c_result = report.task_results.iter().find(|r| r.task_id == c).unwrap();
    assert_eq!(c_result.disposition, RunDisposition::Unstartable);
}

#[tokio::test]
async fn iteration_limit_produces_blocker_and_resume_flow() {
    let coord = coordinator();
    let task = Task::new("Flaky feature", "keeps bouncing", Role::Coder).with_max_iterations(2);
    let id = coord.create_task(task).await.unwrap();

    coord.transition(id, "implementing", None, None).await.unwrap();
    coord.transition(id, "reviewing", None, None).await.unwrap();

    // Two rework cycles are fine
    for _ in 0..2 {
        let t = coord.transition(id, "iteration", None, None).await.unwrap();
        assert_eq!(t.state, TaskState::Iteration);
        coord.transition(id, "implementing", None, None).await.unwrap();
        coord.transition(id, "reviewing", None, None).await.unwrap();
    }

    // The third crosses the bound atomically: blocked, with a blocker
    // naming the limit
    let t = coord.transition(id, "iteration", None, None).await.unwrap();
    assert_eq!(t.state, TaskState::Blocked);
    assert!(t.blockers.iter().any(|b| b.contains("Maximum iterations (2)")));

    // Blocked tasks are not admitted by the executor
    let report = coord
        .execute(Arc::new(SimulatedRunner::new()), Vec::new())
        .await
        .unwrap();
    assert!(!report.success);
    assert_eq!(report.unstartable_tasks, 1);

    // Clearing the blocker restores the recorded state, and the run goes
    // through afterwards
    let t = coord.remove_blocker(id, 0).await.unwrap();
    assert_eq!(t.state, TaskState::Iteration);

    let report = coord
        .execute(Arc::new(SimulatedRunner::new()), Vec::new())
        .await
        .unwrap();
    assert!(report.success);
}

#[tokio::test]
async fn snapshot_persistence_round_trip() {
    let dir = common::temp_dir();
    let path = dir.path().join("tasks.json");

    let store = Arc::new(JsonSnapshotStore::new(path.clone()));
    let coord = Coordinator::new(Config::default()).with_store(store.clone());

    let a = coord.create_task(coder_task("A", &[])).await.unwrap();
    let b = coord.create_task(coder_task("B", &[a])).await.unwrap();
    coord
        .transition(a, "implementing", None, None)
        .await
        .unwrap();
    coord.save().await.unwrap();

    // A second coordinator over the same store sees the committed state
    let coord2 = Coordinator::new(Config::default()).with_store(store);
    let loaded = coord2.load().await.unwrap();
    assert_eq!(loaded, 2);
    assert_eq!(
        coord2.get_task(a).await.unwrap().state,
        TaskState::Implementing
    );
    assert_eq!(coord2.get_task(b).await.unwrap().dependencies, vec![a]);

    let status = coord2.team_status().await;
    assert_eq!(status.total_tasks, 2);
    assert_eq!(status.in_progress, 1);
}

#[tokio::test]
async fn team_status_reflects_blockers_and_readiness() {
    let coord = coordinator();

    let a = coord.create_task(coder_task("A", &[])).await.unwrap();
    let _b = coord.create_task(coder_task("B", &[a])).await.unwrap();
    let c = coord
        .create_task(coder_task("C", &[]).with_parallel_group("wave-1"))
        .await
        .unwrap();

    coord.add_blocker(c, "waiting on vendor").await.unwrap();

    let status = coord.team_status().await;
    assert_eq!(status.total_tasks, 3);
    assert_eq!(status.active_blockers, 1);
    // A is ready; B waits on A; C is blocked
    assert_eq!(status.ready_to_start, 1);
    assert_eq!(status.parallel_groups, 1);
    assert_eq!(status.by_state.get("blocked"), Some(&1));
}
