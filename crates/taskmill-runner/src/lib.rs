//! `taskmill-runner` — spawns a task's interpreter against its script,
//! captures stdout/stderr to per-task log files, and records the outcome in
//! the run-history table.

pub mod error;
pub mod exec;

pub use error::{Result, RunnerError};
pub use exec::{run_by_name, run_task, RunOutcome, RunnerSettings};
