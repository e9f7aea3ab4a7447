use serde::{Deserialize, Serialize};

/// A persisted task record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique human-chosen identifier — primary key.
    pub name: String,
    /// Path to the script handed to the interpreter.
    pub script_path: String,
    /// Interpreter to run the script with; the configured default applies
    /// when `None`.
    pub interpreter: Option<String>,
    /// Working directory for the spawned process, if any.
    pub working_dir: Option<String>,
    /// Standard 5-field cron expression.
    pub cron: String,
    /// Disabled tasks keep their row but are never scheduled.
    pub enabled: bool,
    /// ISO-8601 timestamp of task creation.
    pub created_at: String,
    /// ISO-8601 timestamp of the last metadata update.
    pub updated_at: String,
}

/// Fields required to create a task. Validation happens in
/// [`crate::store::TaskStore::add`].
#[derive(Debug, Clone)]
pub struct NewTask {
    pub name: String,
    pub script_path: String,
    pub interpreter: Option<String>,
    pub working_dir: Option<String>,
    pub cron: String,
}

/// Partial task edit; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub script_path: Option<String>,
    pub interpreter: Option<String>,
    pub working_dir: Option<String>,
    pub cron: Option<String>,
}

/// Outcome state of one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// The process has been spawned and has not exited yet.
    Running,
    /// Exited with code 0.
    Success,
    /// Exited non-zero, or failed to spawn.
    Failed,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunStatus::Running => "running",
            RunStatus::Success => "success",
            RunStatus::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "running" => Ok(RunStatus::Running),
            "success" => Ok(RunStatus::Success),
            "failed" => Ok(RunStatus::Failed),
            other => Err(format!("unknown run status: {other}")),
        }
    }
}

/// One immutable history entry describing a single execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    /// Auto-incrementing primary key.
    pub id: i64,
    /// Name of the task that ran — a reference, not ownership.
    pub task_name: String,
    /// ISO-8601 timestamp of process start.
    pub started_at: String,
    /// ISO-8601 timestamp of process exit; `None` while still running.
    pub finished_at: Option<String>,
    pub status: RunStatus,
    pub exit_code: Option<i32>,
    pub stdout_path: Option<String>,
    pub stderr_path: Option<String>,
    /// Spawn-failure detail, if the process never started.
    pub message: Option<String>,
}
