//! CLI command implementations.

pub mod init;
pub mod run;
pub mod task;
pub mod team;

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::adapters::storage::JsonSnapshotStore;
use crate::infrastructure::config::ConfigLoader;
use crate::services::Coordinator;

/// Load configuration, attach the snapshot store, and restore the task
/// collection. Every command operates on the coordinator this returns.
pub(crate) async fn open_coordinator() -> Result<Coordinator> {
    let config = ConfigLoader::load().context("Failed to load configuration")?;
    let store = Arc::new(JsonSnapshotStore::new(config.storage.path.clone()));
    let coordinator = Coordinator::new(config).with_store(store);
    coordinator
        .load()
        .await
        .context("Failed to load task snapshot")?;
    Ok(coordinator)
}
