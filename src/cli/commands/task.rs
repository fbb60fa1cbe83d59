//! Implementation of the `foreman task` subcommands.

use anyhow::{Context, Result};
use uuid::Uuid;

use crate::cli::output::format_task_table;
use crate::cli::TaskCommands;
use crate::domain::models::{Role, Task, TaskPriority, TaskTreeNode};
use crate::services::registry::TransitionUpdate;
use crate::services::Coordinator;

use super::open_coordinator;

/// Dispatch a `foreman task` subcommand.
pub async fn execute(command: TaskCommands, json: bool) -> Result<()> {
    let coordinator = open_coordinator().await?;

    match command {
        TaskCommands::Create {
            title,
            description,
            assignee,
            priority,
            dependencies,
            parent,
            group,
        } => {
            handle_create(
                &coordinator,
                title,
                description,
                &assignee,
                &priority,
                dependencies,
                parent,
                group,
                json,
            )
            .await
        }
        TaskCommands::List => handle_list(&coordinator, json).await,
        TaskCommands::Show { task_id } => handle_show(&coordinator, task_id, json).await,
        TaskCommands::Update {
            task_id,
            state,
            assignee,
            notes,
            deliverable,
        } => handle_update(&coordinator, task_id, &state, assignee, notes, deliverable, json).await,
        TaskCommands::Depend { task_id, depends_on } => {
            handle_depend(&coordinator, task_id, depends_on, json).await
        }
        TaskCommands::Blocker { task_id, description } => {
            handle_blocker(&coordinator, task_id, description, json).await
        }
        TaskCommands::Unblock { task_id, index } => {
            handle_unblock(&coordinator, task_id, index, json).await
        }
        TaskCommands::Gate {
            task_id,
            gate,
            passed,
        } => handle_gate(&coordinator, task_id, &gate, passed, json).await,
        TaskCommands::Ready => handle_ready(&coordinator, json).await,
        TaskCommands::Parallel => handle_parallel(&coordinator, json).await,
        TaskCommands::Tree { task_id } => handle_tree(&coordinator, task_id, json).await,
    }
}

#[allow(clippy::too_many_arguments)]
async fn handle_create(
    coordinator: &Coordinator,
    title: String,
    description: String,
    assignee: &str,
    priority: &str,
    dependencies: Vec<Uuid>,
    parent: Option<Uuid>,
    group: Option<String>,
    json: bool,
) -> Result<()> {
    let role = Role::from_str(assignee)
        .with_context(|| format!("Unknown assignee role: {assignee}"))?;
    let priority = TaskPriority::from_str(priority)
        .with_context(|| format!("Unknown priority: {priority}"))?;

    let mut task = Task::new(title.clone(), description, role)
        .with_priority(priority)
        .with_max_iterations(coordinator.config().limits.default_max_iterations);
    for dep in dependencies {
        task = task.with_dependency(dep);
    }
    if let Some(label) = group {
        task = task.with_parallel_group(label);
    }

    let task_id = match parent {
        Some(parent_id) => coordinator
            .create_subtask(parent_id, task)
            .await
            .context("Failed to create subtask")?,
        None => coordinator
            .create_task(task)
            .await
            .context("Failed to create task")?,
    };
    coordinator.save().await.context("Failed to save snapshot")?;

    if json {
        let output = serde_json::json!({
            "task_id": task_id,
            "title": title,
            "assignee": role.as_str(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Created task {task_id}: {title}");
    }
    Ok(())
}

async fn handle_list(coordinator: &Coordinator, json: bool) -> Result<()> {
    let tasks = coordinator.list_tasks().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&tasks)?);
    } else if tasks.is_empty() {
        println!("No tasks found.");
    } else {
        println!("{}", format_task_table(&tasks));
        println!("\n{} task(s)", tasks.len());
    }
    Ok(())
}

async fn handle_show(coordinator: &Coordinator, task_id: Uuid, json: bool) -> Result<()> {
    let task = coordinator
        .get_task(task_id)
        .await
        .context("Failed to retrieve task")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&task)?);
    } else {
        println!("Task Details:");
        println!("  ID: {}", task.id);
        println!("  Title: {}", task.title);
        println!("  State: {}", task.state);
        println!("  Assignee: {}", task.assignee);
        println!("  Priority: {}", task.priority.as_str());
        println!(
            "  Iterations: {}/{}",
            task.iteration_count, task.max_iterations
        );
        println!(
            "  Created at: {}",
            task.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        if !task.dependencies.is_empty() {
            println!("  Dependencies:");
            for dep in &task.dependencies {
                println!("    - {dep}");
            }
        }
        if !task.blockers.is_empty() {
            println!("  Blockers:");
            for (idx, blocker) in task.blockers.iter().enumerate() {
                println!("    [{idx}] {blocker}");
            }
        }
        if !task.quality_gates.is_empty() {
            println!("  Quality gates:");
            let mut gates: Vec<_> = task.quality_gates.iter().collect();
            gates.sort();
            for (gate, passed) in gates {
                println!("    {} = {}", gate, passed);
            }
        }
        if !task.handoffs.is_empty() {
            println!("  Handoffs: {}", task.handoffs.len());
            for handoff in &task.handoffs {
                println!(
                    "    {} -> {} at {} (state: {})",
                    handoff.from_role,
                    handoff.to_role,
                    handoff.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
                    handoff.state_at_handoff
                );
            }
        }
    }
    Ok(())
}

async fn handle_update(
    coordinator: &Coordinator,
    task_id: Uuid,
    state: &str,
    assignee: Option<String>,
    notes: Option<String>,
    deliverable: Option<String>,
    json: bool,
) -> Result<()> {
    let task = coordinator
        .transition_with(
            task_id,
            state,
            assignee.as_deref(),
            notes.as_deref(),
            TransitionUpdate {
                context_update: None,
                deliverable,
            },
        )
        .await
        .context("Failed to update task")?;
    coordinator.save().await.context("Failed to save snapshot")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&task)?);
    } else {
        println!(
            "Updated task {task_id} to {} (assignee: {})",
            task.state, task.assignee
        );
    }
    Ok(())
}

async fn handle_depend(
    coordinator: &Coordinator,
    task_id: Uuid,
    depends_on: Uuid,
    json: bool,
) -> Result<()> {
    coordinator
        .add_dependency(task_id, depends_on)
        .await
        .context("Failed to add dependency")?;
    coordinator.save().await.context("Failed to save snapshot")?;

    if json {
        let output = serde_json::json!({
            "task_id": task_id,
            "depends_on": depends_on,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Added dependency: {task_id} depends on {depends_on}");
    }
    Ok(())
}

async fn handle_blocker(
    coordinator: &Coordinator,
    task_id: Uuid,
    description: String,
    json: bool,
) -> Result<()> {
    let task = coordinator
        .add_blocker(task_id, description)
        .await
        .context("Failed to add blocker")?;
    coordinator.save().await.context("Failed to save snapshot")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&task)?);
    } else {
        println!(
            "Added blocker to task {task_id} ({} active)",
            task.blockers.len()
        );
    }
    Ok(())
}

async fn handle_unblock(
    coordinator: &Coordinator,
    task_id: Uuid,
    index: usize,
    json: bool,
) -> Result<()> {
    let task = coordinator
        .remove_blocker(task_id, index)
        .await
        .context("Failed to remove blocker")?;
    coordinator.save().await.context("Failed to save snapshot")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&task)?);
    } else {
        println!(
            "Removed blocker {index} from task {task_id} (state: {})",
            task.state
        );
    }
    Ok(())
}

async fn handle_gate(
    coordinator: &Coordinator,
    task_id: Uuid,
    gate: &str,
    passed: bool,
    json: bool,
) -> Result<()> {
    let task = coordinator
        .set_quality_gate(task_id, gate, passed)
        .await
        .context("Failed to set quality gate")?;
    coordinator.save().await.context("Failed to save snapshot")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&task.quality_gates)?);
    } else {
        println!("Set quality gate '{gate}' to {passed} for task {task_id}");
    }
    Ok(())
}

async fn handle_ready(coordinator: &Coordinator, json: bool) -> Result<()> {
    let ready = coordinator.ready_tasks().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&ready)?);
    } else if ready.is_empty() {
        println!("No tasks ready to start");
    } else {
        println!("Ready tasks:");
        println!("{}", format_task_table(&ready));
    }
    Ok(())
}

async fn handle_parallel(coordinator: &Coordinator, json: bool) -> Result<()> {
    let groups = coordinator.parallel_groups().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&groups)?);
    } else if groups.is_empty() {
        println!("No parallel groups defined");
    } else {
        println!("Parallel execution groups:");
        let mut names: Vec<_> = groups.keys().collect();
        names.sort();
        for name in names {
            println!("\n{name}:");
            for task in &groups[name] {
                println!("  {}: {}", task.id, task.title);
            }
        }
    }
    Ok(())
}

async fn handle_tree(coordinator: &Coordinator, task_id: Uuid, json: bool) -> Result<()> {
    let tree = coordinator
        .task_tree(task_id)
        .await
        .context("Failed to build task tree")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&tree)?);
    } else {
        print_tree(&tree, 0);
    }
    Ok(())
}

fn print_tree(node: &TaskTreeNode, depth: usize) {
    let indent = "  ".repeat(depth);
    println!(
        "{indent}{} [{}] {} ({})",
        node.task_id, node.state, node.title, node.assignee
    );
    for subtask in &node.subtasks {
        print_tree(subtask, depth + 1);
    }
}
