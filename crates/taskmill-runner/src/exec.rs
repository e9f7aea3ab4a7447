use std::path::PathBuf;
use std::process::Stdio;

use chrono::Utc;
use tokio::process::Command;
use tracing::{info, warn};

use taskmill_store::{RunStatus, Task, TaskStore};

use crate::error::{Result, RunnerError};

/// What the executor needs from configuration.
#[derive(Debug, Clone)]
pub struct RunnerSettings {
    /// Root of the per-task log trees (`<logs_dir>/<task name>/`).
    pub logs_dir: PathBuf,
    /// Interpreter used when the task does not name one.
    pub default_interpreter: String,
}

/// Result of one completed (or spawn-failed-and-recorded) execution.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub run_id: i64,
    pub status: RunStatus,
    pub exit_code: Option<i32>,
    pub stdout_path: PathBuf,
    pub stderr_path: PathBuf,
}

/// Look up `name` and execute it. No run record is written when the task
/// does not exist.
pub async fn run_by_name(
    store: &TaskStore,
    name: &str,
    settings: &RunnerSettings,
) -> Result<RunOutcome> {
    let task = store.get(name)?;
    run_task(store, &task, settings).await
}

/// Execute `task` and record the outcome.
///
/// Output is captured to timestamped log files under a task-named directory
/// (opened in append mode, so two runs in the same second interleave rather
/// than truncate). The run record is inserted as `running` before the spawn
/// and finalised exactly once; spawn failures finalise it as `failed` with
/// the error text.
pub async fn run_task(
    store: &TaskStore,
    task: &Task,
    settings: &RunnerSettings,
) -> Result<RunOutcome> {
    let task_logs = settings.logs_dir.join(&task.name);
    std::fs::create_dir_all(&task_logs)?;

    let started = Utc::now();
    let stamp = started.format("%Y%m%d_%H%M%S");
    let stdout_path = task_logs.join(format!("{stamp}.stdout.log"));
    let stderr_path = task_logs.join(format!("{stamp}.stderr.log"));
    let stdout_file = std::fs::File::options()
        .append(true)
        .create(true)
        .open(&stdout_path)?;
    let stderr_file = std::fs::File::options()
        .append(true)
        .create(true)
        .open(&stderr_path)?;

    let run_id = store.record_run_start(
        &task.name,
        &started.to_rfc3339(),
        stdout_path.to_str(),
        stderr_path.to_str(),
    )?;

    let interpreter = task
        .interpreter
        .as_deref()
        .unwrap_or(&settings.default_interpreter);

    let mut command = Command::new(interpreter);
    command
        .arg(&task.script_path)
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout_file))
        .stderr(Stdio::from(stderr_file));
    if let Some(ref dir) = task.working_dir {
        command.current_dir(dir);
    }

    info!(task = %task.name, interpreter, script = %task.script_path, "spawning task");

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) => {
            store.record_run_end(
                run_id,
                &Utc::now().to_rfc3339(),
                RunStatus::Failed,
                None,
                Some(&e.to_string()),
            )?;
            return Err(RunnerError::Spawn {
                task: task.name.clone(),
                source: e,
            });
        }
    };

    let exit = child.wait().await?;
    let exit_code = exit.code();
    let status = if exit.success() {
        RunStatus::Success
    } else {
        RunStatus::Failed
    };
    store.record_run_end(run_id, &Utc::now().to_rfc3339(), status, exit_code, None)?;

    if status == RunStatus::Failed {
        warn!(task = %task.name, ?exit_code, "task exited non-zero");
    } else {
        info!(task = %task.name, run_id, "task finished");
    }

    Ok(RunOutcome {
        run_id,
        status,
        exit_code,
        stdout_path,
        stderr_path,
    })
}
