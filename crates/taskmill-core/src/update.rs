//! Self-update for source checkouts: fast-forward the local git clone.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::info;

use crate::error::{CoreError, Result};

/// Best-effort guess at the repository root when running from `target/`.
///
/// `<repo>/target/<profile>/taskmill` puts the root three levels above the
/// executable. Returns `None` when the executable location is unavailable.
pub fn default_repo_root() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    exe.ancestors().nth(3).map(Path::to_path_buf)
}

fn ensure_git_available() -> Result<()> {
    which::which("git").map_err(|_| CoreError::GitUnavailable)?;
    Ok(())
}

fn ensure_repository(repo_dir: &Path) -> Result<()> {
    if !repo_dir.exists() || !repo_dir.join(".git").exists() {
        return Err(CoreError::NotARepository {
            path: repo_dir.display().to_string(),
        });
    }
    Ok(())
}

fn run_git(repo_dir: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(repo_dir)
        .output()?;
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    if !output.status.success() {
        let detail = text.trim();
        return Err(CoreError::Git(if detail.is_empty() {
            format!("git {} exited non-zero", args.join(" "))
        } else {
            detail.to_string()
        }));
    }
    Ok(text)
}

/// The git argument lists to run, in order, for one update.
///
/// Fails with [`CoreError::DirtyWorkTree`] when the checkout has local
/// changes and `force` is not set; with `force` the plan ends in a hard
/// reset instead of a fast-forward pull.
pub fn update_plan(dirty: bool, force: bool, branch: &str) -> Result<Vec<Vec<String>>> {
    if dirty && !force {
        return Err(CoreError::DirtyWorkTree);
    }

    let mut plan = vec![
        vec!["fetch".into(), "origin".into(), branch.into()],
        vec!["checkout".into(), branch.into()],
    ];
    if force {
        plan.push(vec![
            "reset".into(),
            "--hard".into(),
            format!("origin/{branch}"),
        ]);
    } else {
        plan.push(vec![
            "pull".into(),
            "--ff-only".into(),
            "origin".into(),
            branch.into(),
        ]);
    }
    Ok(plan)
}

/// Update `repo_dir` to the newest commit on `branch`.
///
/// Returns the aggregated output of the executed git commands.
pub fn update_repository(repo_dir: &Path, branch: &str, force: bool) -> Result<String> {
    ensure_git_available()?;
    ensure_repository(repo_dir)?;

    let status = run_git(repo_dir, &["status", "--porcelain"])?;
    let dirty = !status.trim().is_empty();
    let plan = update_plan(dirty, force, branch)?;

    let mut output = vec![status];
    for args in &plan {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        info!(command = %format!("git {}", args.join(" ")), "running update step");
        output.push(run_git(repo_dir, &args)?);
    }

    Ok(output
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n"))
}
