use serde::{Deserialize, Serialize};

/// Main configuration structure for Foreman
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Maximum number of tasks executed concurrently within a level (1-100)
    #[serde(default = "default_max_parallel_tasks")]
    pub max_parallel_tasks: usize,

    /// Snapshot storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Task limit configuration
    #[serde(default)]
    pub limits: LimitsConfig,
}

const fn default_max_parallel_tasks() -> usize {
    3
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_parallel_tasks: default_max_parallel_tasks(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
            limits: LimitsConfig::default(),
        }
    }
}

/// Snapshot storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StorageConfig {
    /// Path to the task snapshot file
    #[serde(default = "default_storage_path")]
    pub path: String,
}

fn default_storage_path() -> String {
    ".foreman/tasks.json".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Task limit configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LimitsConfig {
    /// Default rework bound applied to newly created tasks
    #[serde(default = "default_max_iterations")]
    pub default_max_iterations: u32,
}

const fn default_max_iterations() -> u32 {
    3
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            default_max_iterations: default_max_iterations(),
        }
    }
}
