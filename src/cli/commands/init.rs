//! Implementation of the `foreman init` command.

use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

use crate::domain::models::Config;

/// Initialize the project-local `.foreman/` directory with a default
/// configuration file.
pub async fn execute(force: bool, json: bool) -> Result<()> {
    let config_dir = Path::new(".foreman");
    let config_path = config_dir.join("config.yaml");

    if config_path.exists() && !force {
        anyhow::bail!(
            "Already initialized ({} exists). Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::create_dir_all(config_dir)
        .await
        .context("Failed to create .foreman directory")?;

    let config = Config::default();
    let yaml = serde_yaml::to_string(&config).context("Failed to serialize default config")?;
    fs::write(&config_path, yaml)
        .await
        .context("Failed to write config file")?;

    if json {
        let output = serde_json::json!({
            "success": true,
            "config_path": config_path.display().to_string(),
            "storage_path": config.storage.path,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Initialized Foreman project");
        println!("  Config: {}", config_path.display());
        println!("  Task storage: {}", config.storage.path);
    }

    Ok(())
}
