//! Foreman - Task Coordination for Specialist Role Pipelines
//!
//! Foreman coordinates work items that pass through a fixed pipeline of
//! specialist roles. Tasks may depend on one another; the scheduler orders
//! them into maximal-concurrency levels, and the executor runs each level
//! under a concurrency cap while the state machine tracks lifecycle,
//! handoffs, blockers, iteration limits, and quality gates.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Pure business logic, models, and ports
//! - **Service Layer** (`services`): Graph, scheduler, executor, registry,
//!   and the coordination facade
//! - **Adapters** (`adapters`): Implementations of the runner and snapshot
//!   store ports
//! - **Infrastructure Layer** (`infrastructure`): Configuration management
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use foreman::domain::models::{Config, Role, Task};
//! use foreman::services::Coordinator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let coordinator = Coordinator::new(Config::default());
//!     let design = coordinator
//!         .create_task(Task::new("Design schema", "Auth tables", Role::Architect))
//!         .await?;
//!     let implement = coordinator
//!         .create_task(Task::new("Implement API", "Login endpoint", Role::Coder)
//!             .with_dependency(design))
//!         .await?;
//!     let plan = coordinator.plan().await;
//!     assert_eq!(plan.total_levels(), 2);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    Config, HandoffRecord, LimitsConfig, LoggingConfig, Role, StorageConfig, Task, TaskContext,
    TaskPriority, TaskState, TaskTreeNode, TeamStatus,
};
pub use domain::ports::{RunOutcome, SnapshotStore, TaskRunner, TaskSnapshot};
pub use domain::{CoordinationError, CoordinationResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    Coordinator, DependencyGraph, ExecutionReport, ExecutionStatus, ExecutorConfig, LevelExecutor,
    LevelScheduler, SchedulePlan, TaskRegistry,
};
