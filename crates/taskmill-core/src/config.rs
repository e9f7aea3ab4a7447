use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const APP_NAME: &str = "taskmill";
pub const DB_FILENAME: &str = "taskmill.db";

/// Top-level config (taskmill.toml + TASKMILL_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TaskmillConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub runner: RunnerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory holding the SQLite database and per-task log trees.
    #[serde(default = "default_data_dir")]
    pub dir: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between reconciliation passes over the task table.
    #[serde(default = "default_refresh")]
    pub refresh: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            refresh: default_refresh(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Interpreter used when a task does not name one explicitly.
    #[serde(default = "default_interpreter")]
    pub interpreter: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
        }
    }
}

impl TaskmillConfig {
    /// Load config from a TOML file with TASKMILL_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.taskmill/taskmill.toml
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: TaskmillConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("TASKMILL_").split("_"))
            .extract()
            .map_err(|e| crate::error::CoreError::Config(e.to_string()))?;

        Ok(config)
    }

    pub fn data_dir(&self) -> &Path {
        Path::new(&self.data.dir)
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir().join(DB_FILENAME)
    }

    /// Root of the per-task log trees (`<data>/logs/<task name>/`).
    pub fn logs_dir(&self) -> PathBuf {
        self.data_dir().join("logs")
    }

    /// Create the data directory if it does not exist.
    pub fn ensure_data_dir(&self) -> crate::error::Result<()> {
        std::fs::create_dir_all(self.data_dir())?;
        Ok(())
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{home}/.{APP_NAME}/{APP_NAME}.toml")
}

fn default_data_dir() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{home}/.{APP_NAME}")
}

fn default_refresh() -> u64 {
    30
}

fn default_interpreter() -> String {
    "python3".to_string()
}
