//! JSON file snapshot store.
//!
//! Persists the full task collection as a pretty-printed JSON document.
//! Saves are all-or-nothing: the snapshot is written to a temporary file
//! and renamed over the previous one, so a failed save leaves the last
//! good snapshot intact.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::domain::errors::{CoordinationError, CoordinationResult};
use crate::domain::ports::{SnapshotStore, TaskSnapshot};

/// Snapshot store backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonSnapshotStore {
    path: PathBuf,
}

impl JsonSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn ensure_parent_dir(&self) -> CoordinationResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for JsonSnapshotStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn load(&self) -> CoordinationResult<TaskSnapshot> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => {
                let snapshot: TaskSnapshot = serde_json::from_slice(&bytes)?;
                debug!(task_count = snapshot.tasks.len(), "snapshot loaded");
                Ok(snapshot)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("no snapshot file yet; starting empty");
                Ok(TaskSnapshot::default())
            }
            Err(err) => Err(CoordinationError::StorageError(err.to_string())),
        }
    }

    #[instrument(skip(self, snapshot), fields(path = %self.path.display(), task_count = snapshot.tasks.len()))]
    async fn save(&self, snapshot: &TaskSnapshot) -> CoordinationResult<()> {
        self.ensure_parent_dir().await?;

        let json = serde_json::to_vec_pretty(snapshot)?;
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &json).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;

        debug!("snapshot saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Role, Task, TaskState};

    #[tokio::test]
    async fn test_load_missing_file_returns_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonSnapshotStore::new(dir.path().join("tasks.json"));

        let snapshot = store.load().await.unwrap();
        assert!(snapshot.is_empty());
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonSnapshotStore::new(dir.path().join("nested").join("tasks.json"));

        let mut task = Task::new("Persisted", "d", Role::Coder);
        task.state = TaskState::Implementing;
        let task_id = task.id;

        store.save(&TaskSnapshot::new(vec![task])).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.tasks.len(), 1);
        assert_eq!(loaded.tasks[0].id, task_id);
        assert_eq!(loaded.tasks[0].state, TaskState::Implementing);
        assert!(loaded.saved_at.is_some());
    }

    #[tokio::test]
    async fn test_save_replaces_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonSnapshotStore::new(dir.path().join("tasks.json"));

        store
            .save(&TaskSnapshot::new(vec![Task::new("one", "d", Role::Coder)]))
            .await
            .unwrap();
        store
            .save(&TaskSnapshot::new(vec![
                Task::new("two", "d", Role::Coder),
                Task::new("three", "d", Role::Coder),
            ]))
            .await
            .unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.tasks.len(), 2);
    }

    #[tokio::test]
    async fn test_load_corrupt_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        tokio::fs::write(&path, b"{not json").await.unwrap();

        let store = JsonSnapshotStore::new(path);
        let err = store.load().await.unwrap_err();
        assert!(matches!(err, CoordinationError::SerializationError(_)));
    }
}
