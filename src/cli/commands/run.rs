//! Implementation of the `foreman plan` and `foreman run` commands.

use std::sync::Arc;

use anyhow::{Context, Result};
use uuid::Uuid;

use crate::adapters::runners::SimulatedRunner;
use crate::adapters::storage::JsonSnapshotStore;
use crate::cli::output::format_plan_table;
use crate::infrastructure::config::ConfigLoader;
use crate::services::{Coordinator, ExecutionReport};

use super::open_coordinator;

/// Compute and print the level schedule without executing it.
pub async fn execute_plan(json: bool) -> Result<()> {
    let coordinator = open_coordinator().await?;
    let plan = coordinator.plan().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else if plan.total_levels() == 0 && plan.unscheduled.is_empty() {
        println!("Nothing to schedule.");
    } else {
        println!(
            "Execution plan: {} level(s), {} task(s) scheduled",
            plan.total_levels(),
            plan.scheduled_tasks()
        );
        println!("{}", format_plan_table(&plan));
        if !plan.is_fully_scheduled() {
            println!(
                "\nWarning: {} task(s) could not be scheduled (cycle or unsatisfied dependency)",
                plan.unscheduled.len()
            );
        }
    }
    Ok(())
}

/// Execute the schedule with the simulated runner.
pub async fn execute(cap: Option<usize>, gate_tasks: Vec<Uuid>, json: bool) -> Result<()> {
    let mut config = ConfigLoader::load().context("Failed to load configuration")?;
    if let Some(cap) = cap {
        anyhow::ensure!(cap > 0, "Concurrency cap must be at least 1");
        config.max_parallel_tasks = cap;
    }

    let store = Arc::new(JsonSnapshotStore::new(config.storage.path.clone()));
    let coordinator = Coordinator::new(config).with_store(store);
    coordinator
        .load()
        .await
        .context("Failed to load task snapshot")?;

    let report = coordinator
        .execute(Arc::new(SimulatedRunner::new()), gate_tasks)
        .await
        .context("Execution failed")?;
    coordinator.save().await.context("Failed to save snapshot")?;

    if json {
        print_report_json(&report)?;
    } else {
        print_report(&report);
    }

    if !report.success {
        std::process::exit(1);
    }
    Ok(())
}

fn print_report_json(report: &ExecutionReport) -> Result<()> {
    let output = serde_json::json!({
        "success": report.success,
        "total_tasks": report.total_tasks,
        "completed_tasks": report.completed_tasks,
        "failed_tasks": report.failed_tasks,
        "cancelled_tasks": report.cancelled_tasks,
        "unstartable_tasks": report.unstartable_tasks,
        "unscheduled_tasks": report.unscheduled.len(),
        "total_duration_ms": report.total_duration_ms,
        "errors": report
            .errors
            .iter()
            .map(|(id, error)| serde_json::json!({ "task_id": id, "error": error }))
            .collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_report(report: &ExecutionReport) {
    println!("Execution complete:");
    println!("  Total: {}", report.total_tasks);
    println!("  Completed: {}", report.completed_tasks);
    println!("  Failed: {}", report.failed_tasks);
    if report.cancelled_tasks > 0 {
        println!("  Cancelled: {}", report.cancelled_tasks);
    }
    if report.unstartable_tasks > 0 {
        println!("  Unstartable: {}", report.unstartable_tasks);
    }
    if !report.unscheduled.is_empty() {
        println!("  Unscheduled: {}", report.unscheduled.len());
    }
    println!("  Duration: {}ms", report.total_duration_ms);

    if !report.errors.is_empty() {
        println!("\nErrors:");
        for (task_id, error) in &report.errors {
            println!("  {task_id}: {error}");
        }
    }

    if !report.quality_gate_results.is_empty() {
        println!("\nQuality gates:");
        for (task_id, validation) in &report.quality_gate_results {
            let verdict = if validation.valid { "passed" } else { "failed" };
            match &validation.reason {
                Some(reason) => println!("  {task_id}: {verdict} ({reason})"),
                None => println!("  {task_id}: {verdict}"),
            }
        }
    }

    println!("\nOverall: {}", if report.success { "success" } else { "failure" });
}
