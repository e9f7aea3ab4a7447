//! `taskmill-store` — SQLite persistence for tasks and run history.
//!
//! # Overview
//!
//! Two tables: `tasks` (one row per named, schedulable script) and `runs`
//! (append-only history of executions). [`store::TaskStore`] wraps a single
//! connection behind a mutex; each operation is one locked unit, so callers
//! never observe partial writes.
//!
//! Cron expressions use the standard 5-field form (minute, hour,
//! day-of-month, month, day-of-week) and are validated at task construction
//! via [`schedule::parse_cron`].

pub mod db;
pub mod error;
pub mod schedule;
pub mod store;
pub mod types;

pub use schedule::parse_cron;
pub use error::{Result, StoreError};
pub use store::TaskStore;
pub use types::{NewTask, RunRecord, RunStatus, Task, TaskUpdate};
