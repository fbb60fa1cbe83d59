//! Common test utilities for integration tests
//!
//! Provides shared fixtures and helpers used across multiple integration
//! test files.

use foreman::domain::models::{Role, Task};
use tempfile::TempDir;
use uuid::Uuid;

/// Create a temporary directory for test isolation
///
/// Returns a TempDir that will be cleaned up when dropped.
#[allow(dead_code)]
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
#[allow(dead_code)]
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Build a coder task with the given title and dependencies.
#[allow(dead_code)]
pub fn coder_task(title: &str, deps: &[Uuid]) -> Task {
    let mut task = Task::new(title, "integration test task", Role::Coder);
    task.dependencies = deps.to_vec();
    task
}
