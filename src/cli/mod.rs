//! Command-line interface for Foreman.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "foreman")]
#[command(about = "Foreman - dependency-aware task coordination for specialist role pipelines", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize Foreman configuration and task storage
    Init {
        /// Force reinitialization even if already initialized
        #[arg(short, long)]
        force: bool,
    },

    /// Task management commands
    #[command(subcommand)]
    Task(TaskCommands),

    /// Show team-wide status
    Team,

    /// Compute the level schedule for the current task collection
    Plan,

    /// Execute the schedule with the simulated runner
    Run {
        /// Override the concurrency cap from configuration
        #[arg(short, long)]
        cap: Option<usize>,

        /// Task IDs whose quality gates are validated after the run
        /// (comma-separated)
        #[arg(short = 'g', long, value_delimiter = ',')]
        gate_tasks: Vec<Uuid>,
    },
}

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Create a new task
    Create {
        /// Task title (positional argument)
        title: String,

        /// Detailed description
        #[arg(short, long, default_value = "")]
        description: String,

        /// Assignee role (architect, coder, pr_reviewer, qa_tester, coordinator)
        #[arg(short, long, default_value = "coder")]
        assignee: String,

        /// Task priority (low, medium, high, critical)
        #[arg(short, long, default_value = "medium")]
        priority: String,

        /// Task dependencies (comma-separated UUIDs)
        #[arg(short = 'D', long, value_delimiter = ',')]
        dependencies: Vec<Uuid>,

        /// Parent task ID (creates a subtask)
        #[arg(long)]
        parent: Option<Uuid>,

        /// Advisory parallel group label
        #[arg(long)]
        group: Option<String>,
    },

    /// List all tasks
    List,

    /// Show details for a specific task
    Show {
        /// Task ID
        task_id: Uuid,
    },

    /// Transition a task's state, optionally handing off to a new role
    Update {
        /// Task ID
        task_id: Uuid,

        /// New lifecycle state
        state: String,

        /// New assignee role (records a handoff when it changes)
        #[arg(short, long)]
        assignee: Option<String>,

        /// Notes attached to the handoff
        #[arg(short, long)]
        notes: Option<String>,

        /// Deliverable record to append
        #[arg(long)]
        deliverable: Option<String>,
    },

    /// Add a dependency between two tasks
    Depend {
        /// Task ID
        task_id: Uuid,
        /// Task it depends on
        depends_on: Uuid,
    },

    /// Add a blocker to a task
    Blocker {
        /// Task ID
        task_id: Uuid,
        /// Blocker description
        description: String,
    },

    /// Remove a blocker from a task by index
    Unblock {
        /// Task ID
        task_id: Uuid,
        /// Blocker index
        index: usize,
    },

    /// Set a quality gate on a task
    Gate {
        /// Task ID
        task_id: Uuid,
        /// Gate name
        gate: String,
        /// Pass/fail
        #[arg(value_parser = clap::value_parser!(bool))]
        passed: bool,
    },

    /// List tasks whose dependencies are all complete
    Ready,

    /// Show tasks grouped by their advisory parallel-group label
    Parallel,

    /// Show a task with its subtasks as a tree
    Tree {
        /// Task ID
        task_id: Uuid,
    },
}

/// Print an error consistently and exit non-zero.
pub fn handle_error(err: anyhow::Error, json: bool) {
    if json {
        let output = serde_json::json!({
            "error": err.to_string(),
            "causes": err.chain().skip(1).map(ToString::to_string).collect::<Vec<_>>(),
        });
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_else(|_| err.to_string())
        );
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1);
}
