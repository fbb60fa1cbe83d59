pub mod config;
pub mod report;
pub mod task;

pub use config::{Config, LimitsConfig, LoggingConfig, StorageConfig};
pub use report::{TaskTreeNode, TeamStatus};
pub use task::{HandoffRecord, Role, Task, TaskContext, TaskPriority, TaskState};
