//! Table output formatting for CLI commands using comfy-table.

use comfy_table::{presets, Attribute, Cell, ContentArrangement, Table};

use crate::domain::models::{Task, TeamStatus};
use crate::services::SchedulePlan;

fn base_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_BORDERS_ONLY)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn header(cells: &[&str]) -> Vec<Cell> {
    cells
        .iter()
        .map(|c| Cell::new(c).add_attribute(Attribute::Bold))
        .collect()
}

fn short_id(id: uuid::Uuid) -> String {
    id.to_string()[..8].to_string()
}

fn truncate_text(text: &str, max_len: usize) -> String {
    if text.len() <= max_len {
        text.to_string()
    } else {
        format!("{}...", &text[..max_len.saturating_sub(3)])
    }
}

/// Format a list of tasks as a table.
pub fn format_task_table(tasks: &[Task]) -> String {
    let mut table = base_table();
    table.set_header(header(&[
        "ID", "Title", "State", "Assignee", "Priority", "Deps", "Blockers",
    ]));

    for task in tasks {
        table.add_row(vec![
            Cell::new(short_id(task.id)),
            Cell::new(truncate_text(&task.title, 40)),
            Cell::new(task.state.as_str()),
            Cell::new(task.assignee.as_str()),
            Cell::new(task.priority.as_str()),
            Cell::new(task.dependencies.len()),
            Cell::new(task.blockers.len()),
        ]);
    }

    table.to_string()
}

/// Format the team status summary as a table.
pub fn format_team_status_table(status: &TeamStatus) -> String {
    let mut table = base_table();
    table.set_header(header(&["Metric", "Value"]));
    table.add_row(vec!["Total tasks".to_string(), status.total_tasks.to_string()]);
    table.add_row(vec!["Completed".to_string(), status.completed_tasks.to_string()]);
    table.add_row(vec!["In progress".to_string(), status.in_progress.to_string()]);
    table.add_row(vec!["Ready to start".to_string(), status.ready_to_start.to_string()]);
    table.add_row(vec!["Active blockers".to_string(), status.active_blockers.to_string()]);
    table.add_row(vec!["Parallel groups".to_string(), status.parallel_groups.to_string()]);

    let mut by_state: Vec<_> = status.by_state.iter().collect();
    by_state.sort();
    for (state, count) in by_state {
        table.add_row(vec![format!("  state: {state}"), count.to_string()]);
    }

    table.to_string()
}

/// Format a schedule plan as a table of levels.
pub fn format_plan_table(plan: &SchedulePlan) -> String {
    let mut table = base_table();
    table.set_header(header(&["Level", "Tasks"]));

    for level in &plan.levels {
        let ids: Vec<String> = level.task_ids.iter().map(|id| short_id(*id)).collect();
        table.add_row(vec![
            Cell::new(level.level),
            Cell::new(ids.join(", ")),
        ]);
    }

    if !plan.unscheduled.is_empty() {
        let ids: Vec<String> = plan
            .unscheduled
            .iter()
            .map(|u| short_id(u.task_id))
            .collect();
        table.add_row(vec![
            Cell::new("unscheduled"),
            Cell::new(format!("{} (cycle or unsatisfied dependency)", ids.join(", "))),
        ]);
    }

    table.to_string()
}
