use std::time::Duration;

use anyhow::Context;
use tracing::info;

use taskmill_core::{update, TaskmillConfig};
use taskmill_runner::{run_by_name, RunnerSettings};
use taskmill_scheduler::Reconciler;
use taskmill_store::{NewTask, TaskStore, TaskUpdate};

fn open_store(config: &TaskmillConfig) -> anyhow::Result<TaskStore> {
    TaskStore::open(&config.db_path())
        .with_context(|| format!("cannot open database at {}", config.db_path().display()))
}

fn runner_settings(config: &TaskmillConfig) -> RunnerSettings {
    RunnerSettings {
        logs_dir: config.logs_dir(),
        default_interpreter: config.runner.interpreter.clone(),
    }
}

pub fn add(
    config: &TaskmillConfig,
    name: String,
    script: String,
    cron: String,
    interpreter: Option<String>,
    working_dir: Option<String>,
) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let task = store.add(NewTask {
        name,
        script_path: script,
        interpreter,
        working_dir,
        cron,
    })?;
    println!("added task '{}' ({})", task.name, task.cron);
    Ok(())
}

pub fn edit(
    config: &TaskmillConfig,
    name: &str,
    script: Option<String>,
    cron: Option<String>,
    interpreter: Option<String>,
    working_dir: Option<String>,
) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let task = store.update(
        name,
        TaskUpdate {
            script_path: script,
            interpreter,
            working_dir,
            cron,
        },
    )?;
    println!("updated task '{}'", task.name);
    Ok(())
}

pub fn set_enabled(config: &TaskmillConfig, name: &str, enabled: bool) -> anyhow::Result<()> {
    let store = open_store(config)?;
    store.set_enabled(name, enabled)?;
    println!(
        "{} task '{name}'",
        if enabled { "enabled" } else { "disabled" }
    );
    Ok(())
}

pub fn remove(config: &TaskmillConfig, name: &str) -> anyhow::Result<()> {
    let store = open_store(config)?;
    store.remove(name)?;
    println!("removed task '{name}'");
    Ok(())
}

pub fn list(config: &TaskmillConfig) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let tasks = store.list()?;
    if tasks.is_empty() {
        println!("no tasks defined");
        return Ok(());
    }

    println!(
        "{:<20} {:<36} {:<16} {:<8} {}",
        "NAME", "SCRIPT", "CRON", "ENABLED", "INTERPRETER"
    );
    for task in tasks {
        println!(
            "{:<20} {:<36} {:<16} {:<8} {}",
            task.name,
            task.script_path,
            task.cron,
            if task.enabled { "yes" } else { "no" },
            task.interpreter.as_deref().unwrap_or("(default)"),
        );
    }
    Ok(())
}

pub fn runs(config: &TaskmillConfig, limit: usize, name: Option<&str>) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let runs = store.recent_runs(limit, name)?;
    if runs.is_empty() {
        println!("no run history");
        return Ok(());
    }

    println!(
        "{:<6} {:<20} {:<26} {:<26} {:<8} {}",
        "ID", "TASK", "STARTED", "FINISHED", "STATUS", "EXIT"
    );
    for run in runs {
        println!(
            "{:<6} {:<20} {:<26} {:<26} {:<8} {}",
            run.id,
            run.task_name,
            run.started_at,
            run.finished_at.as_deref().unwrap_or("-"),
            run.status,
            run.exit_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "-".into()),
        );
    }
    Ok(())
}

pub async fn run_once(config: &TaskmillConfig, name: &str) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let outcome = run_by_name(&store, name, &runner_settings(config)).await?;
    println!(
        "task '{name}' finished: {} (exit code {})",
        outcome.status,
        outcome
            .exit_code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".into()),
    );
    println!("stdout: {}", outcome.stdout_path.display());
    println!("stderr: {}", outcome.stderr_path.display());
    Ok(())
}

pub async fn start(config: &TaskmillConfig, refresh: Option<u64>) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let refresh = Duration::from_secs(refresh.unwrap_or(config.scheduler.refresh));
    let reconciler = Reconciler::new(store, runner_settings(config), refresh);

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let loop_handle = tokio::spawn(reconciler.run(shutdown_rx));

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for interrupt")?;
    info!("interrupt received, stopping scheduler");
    let _ = shutdown_tx.send(true);
    loop_handle.await.context("scheduler loop panicked")?;

    println!("scheduler stopped");
    Ok(())
}

pub fn self_update(branch: &str, force: bool, repo_dir: Option<String>) -> anyhow::Result<()> {
    let repo_dir = match repo_dir {
        Some(dir) => std::path::PathBuf::from(dir),
        None => update::default_repo_root()
            .context("cannot infer the repository root; pass --repo-dir")?,
    };

    println!("updating {} from branch '{branch}'", repo_dir.display());
    let output = update::update_repository(&repo_dir, branch, force)?;
    if !output.is_empty() {
        println!("{output}");
    }
    println!("update complete");
    Ok(())
}
