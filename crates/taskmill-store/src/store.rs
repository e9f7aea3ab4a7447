use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use rusqlite::Connection;
use tracing::info;

use crate::schedule::parse_cron;
use crate::db::init_db;
use crate::error::{Result, StoreError};
use crate::types::{NewTask, RunRecord, RunStatus, Task, TaskUpdate};

/// Thread-safe handle over the task and run-history tables.
///
/// Wraps a single SQLite connection in a mutex; each public operation takes
/// the lock once, so other readers never observe a half-applied write.
/// Cloning is cheap and shares the connection.
#[derive(Clone)]
pub struct TaskStore {
    db: Arc<Mutex<Connection>>,
}

impl TaskStore {
    /// Wrap an already-open connection, initialising the schema if needed.
    pub fn new(conn: Connection) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open (or create) the database file at `path` with WAL journaling.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        Self::new(conn)
    }

    /// Insert a new task. Fails with `DuplicateName` if the name is taken or
    /// `InvalidCron` if the expression does not parse; the store is left
    /// unchanged on failure.
    pub fn add(&self, new: NewTask) -> Result<Task> {
        parse_cron(&new.cron)?;

        let db = self.db.lock().unwrap();
        let exists: bool = db.query_row(
            "SELECT EXISTS(SELECT 1 FROM tasks WHERE name = ?1)",
            [&new.name],
            |row| row.get(0),
        )?;
        if exists {
            return Err(StoreError::DuplicateName { name: new.name });
        }

        let now = Utc::now().to_rfc3339();
        db.execute(
            "INSERT INTO tasks
             (name, script_path, interpreter, working_dir, cron, enabled, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?6)",
            rusqlite::params![
                new.name,
                new.script_path,
                new.interpreter,
                new.working_dir,
                new.cron,
                now
            ],
        )?;
        info!(task = %new.name, cron = %new.cron, "task added");
        drop(db);

        self.get(&new.name)
    }

    /// Apply a partial edit; a changed cron expression is re-validated.
    pub fn update(&self, name: &str, update: TaskUpdate) -> Result<Task> {
        if let Some(ref cron) = update.cron {
            parse_cron(cron)?;
        }
        let current = self.get(name)?;

        let script_path = update.script_path.unwrap_or(current.script_path);
        let interpreter = update.interpreter.or(current.interpreter);
        let working_dir = update.working_dir.or(current.working_dir);
        let cron = update.cron.unwrap_or(current.cron);
        let now = Utc::now().to_rfc3339();

        let db = self.db.lock().unwrap();
        db.execute(
            "UPDATE tasks
             SET script_path = ?1, interpreter = ?2, working_dir = ?3,
                 cron = ?4, updated_at = ?5
             WHERE name = ?6",
            rusqlite::params![script_path, interpreter, working_dir, cron, now, name],
        )?;
        info!(task = %name, "task updated");
        drop(db);

        self.get(name)
    }

    /// Flip the enabled flag. Disabled tasks keep their row but are never
    /// scheduled.
    pub fn set_enabled(&self, name: &str, enabled: bool) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let db = self.db.lock().unwrap();
        let n = db.execute(
            "UPDATE tasks SET enabled = ?1, updated_at = ?2 WHERE name = ?3",
            rusqlite::params![enabled, now, name],
        )?;
        if n == 0 {
            return Err(StoreError::TaskNotFound {
                name: name.to_string(),
            });
        }
        info!(task = %name, enabled, "task enabled flag changed");
        Ok(())
    }

    /// Delete a task by name. Returns `TaskNotFound` if no row is deleted;
    /// the caller decides whether that counts as success.
    pub fn remove(&self, name: &str) -> Result<()> {
        let db = self.db.lock().unwrap();
        let n = db.execute("DELETE FROM tasks WHERE name = ?1", [name])?;
        if n == 0 {
            return Err(StoreError::TaskNotFound {
                name: name.to_string(),
            });
        }
        info!(task = %name, "task removed");
        Ok(())
    }

    /// Fetch one task by name.
    pub fn get(&self, name: &str) -> Result<Task> {
        let db = self.db.lock().unwrap();
        match db.query_row(
            "SELECT name, script_path, interpreter, working_dir, cron, enabled,
                    created_at, updated_at
             FROM tasks WHERE name = ?1",
            [name],
            row_to_task,
        ) {
            Ok(task) => Ok(task),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(StoreError::TaskNotFound {
                name: name.to_string(),
            }),
            Err(e) => Err(StoreError::Database(e)),
        }
    }

    /// Return all tasks ordered by name.
    pub fn list(&self) -> Result<Vec<Task>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT name, script_path, interpreter, working_dir, cron, enabled,
                    created_at, updated_at
             FROM tasks ORDER BY name",
        )?;
        let rows = stmt.query_map([], row_to_task)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Insert a `running` run record and return its id.
    pub fn record_run_start(
        &self,
        task_name: &str,
        started_at: &str,
        stdout_path: Option<&str>,
        stderr_path: Option<&str>,
    ) -> Result<i64> {
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO runs (task_name, started_at, status, stdout_path, stderr_path)
             VALUES (?1, ?2, 'running', ?3, ?4)",
            rusqlite::params![task_name, started_at, stdout_path, stderr_path],
        )?;
        Ok(db.last_insert_rowid())
    }

    /// Finalise a run record. Records are never modified again afterwards.
    pub fn record_run_end(
        &self,
        run_id: i64,
        finished_at: &str,
        status: RunStatus,
        exit_code: Option<i32>,
        message: Option<&str>,
    ) -> Result<()> {
        let db = self.db.lock().unwrap();
        db.execute(
            "UPDATE runs
             SET finished_at = ?1, status = ?2, exit_code = ?3,
                 message = COALESCE(?4, message)
             WHERE id = ?5",
            rusqlite::params![finished_at, status.to_string(), exit_code, message, run_id],
        )?;
        Ok(())
    }

    /// The most recent `limit` run records, newest first, optionally
    /// filtered to one task.
    pub fn recent_runs(&self, limit: usize, task_name: Option<&str>) -> Result<Vec<RunRecord>> {
        let db = self.db.lock().unwrap();
        let base = "SELECT id, task_name, started_at, finished_at, status, exit_code,
                           stdout_path, stderr_path, message
                    FROM runs";

        let records = if let Some(name) = task_name {
            let mut stmt = db.prepare(&format!(
                "{base} WHERE task_name = ?1 ORDER BY started_at DESC LIMIT ?2"
            ))?;
            let rows = stmt.query_map(rusqlite::params![name, limit as i64], row_to_run)?;
            rows.filter_map(|r| r.ok()).collect()
        } else {
            let mut stmt =
                db.prepare(&format!("{base} ORDER BY started_at DESC LIMIT ?1"))?;
            let rows = stmt.query_map(rusqlite::params![limit as i64], row_to_run)?;
            rows.filter_map(|r| r.ok()).collect()
        };
        Ok(records)
    }
}

fn row_to_task(row: &rusqlite::Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        name: row.get(0)?,
        script_path: row.get(1)?,
        interpreter: row.get(2)?,
        working_dir: row.get(3)?,
        cron: row.get(4)?,
        enabled: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn row_to_run(row: &rusqlite::Row<'_>) -> rusqlite::Result<RunRecord> {
    let status: String = row.get(4)?;
    Ok(RunRecord {
        id: row.get(0)?,
        task_name: row.get(1)?,
        started_at: row.get(2)?,
        finished_at: row.get(3)?,
        status: status.parse().unwrap_or(RunStatus::Failed),
        exit_code: row.get(5)?,
        stdout_path: row.get(6)?,
        stderr_path: row.get(7)?,
        message: row.get(8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> TaskStore {
        TaskStore::new(Connection::open_in_memory().expect("open")).expect("init")
    }

    fn backup_task() -> NewTask {
        NewTask {
            name: "backup".into(),
            script_path: "/jobs/backup.py".into(),
            interpreter: None,
            working_dir: None,
            cron: "0 2 * * *".into(),
        }
    }

    #[test]
    fn add_then_get_roundtrips() {
        let store = store();
        let added = store.add(backup_task()).expect("add");
        let fetched = store.get("backup").expect("get");
        assert_eq!(fetched.name, added.name);
        assert_eq!(fetched.script_path, "/jobs/backup.py");
        assert_eq!(fetched.cron, "0 2 * * *");
        assert!(fetched.enabled);
        assert_eq!(fetched.interpreter, None);
    }

    #[test]
    fn duplicate_add_fails_and_leaves_store_unchanged() {
        let store = store();
        store.add(backup_task()).expect("first add");

        let mut dup = backup_task();
        dup.script_path = "/jobs/other.py".into();
        assert!(matches!(
            store.add(dup),
            Err(StoreError::DuplicateName { .. })
        ));

        let task = store.get("backup").expect("get");
        assert_eq!(task.script_path, "/jobs/backup.py");
        assert_eq!(store.list().expect("list").len(), 1);
    }

    #[test]
    fn invalid_cron_is_rejected_at_add() {
        let store = store();
        let mut new = backup_task();
        new.cron = "not a cron".into();
        assert!(matches!(
            store.add(new),
            Err(StoreError::InvalidCron { .. })
        ));
        assert!(store.list().expect("list").is_empty());
    }

    #[test]
    fn get_missing_task_is_not_found() {
        assert!(matches!(
            store().get("ghost"),
            Err(StoreError::TaskNotFound { .. })
        ));
    }

    #[test]
    fn update_changes_only_given_fields() {
        let store = store();
        store.add(backup_task()).expect("add");

        let task = store
            .update(
                "backup",
                TaskUpdate {
                    cron: Some("*/10 * * * *".into()),
                    ..Default::default()
                },
            )
            .expect("update");
        assert_eq!(task.cron, "*/10 * * * *");
        assert_eq!(task.script_path, "/jobs/backup.py");
    }

    #[test]
    fn update_validates_new_cron() {
        let store = store();
        store.add(backup_task()).expect("add");
        let result = store.update(
            "backup",
            TaskUpdate {
                cron: Some("99 * * * *".into()),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(StoreError::InvalidCron { .. })));
        assert_eq!(store.get("backup").expect("get").cron, "0 2 * * *");
    }

    #[test]
    fn update_missing_task_is_not_found() {
        assert!(matches!(
            store().update("ghost", TaskUpdate::default()),
            Err(StoreError::TaskNotFound { .. })
        ));
    }

    #[test]
    fn enable_disable_flips_the_flag() {
        let store = store();
        store.add(backup_task()).expect("add");
        store.set_enabled("backup", false).expect("disable");
        assert!(!store.get("backup").expect("get").enabled);
        store.set_enabled("backup", true).expect("enable");
        assert!(store.get("backup").expect("get").enabled);
    }

    #[test]
    fn remove_missing_task_is_not_found() {
        assert!(matches!(
            store().remove("ghost"),
            Err(StoreError::TaskNotFound { .. })
        ));
    }

    #[test]
    fn remove_deletes_the_row() {
        let store = store();
        store.add(backup_task()).expect("add");
        store.remove("backup").expect("remove");
        assert!(store.list().expect("list").is_empty());
    }

    #[test]
    fn list_is_ordered_by_name() {
        let store = store();
        for name in ["zeta", "alpha", "mid"] {
            let mut new = backup_task();
            new.name = name.into();
            store.add(new).expect("add");
        }
        let names: Vec<String> = store
            .list()
            .expect("list")
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, ["alpha", "mid", "zeta"]);
    }

    #[test]
    fn run_history_records_and_orders_newest_first() {
        let store = store();
        store.add(backup_task()).expect("add");

        let first = store
            .record_run_start("backup", "2026-01-01T00:00:00+00:00", None, None)
            .expect("start");
        store
            .record_run_end(first, "2026-01-01T00:00:05+00:00", RunStatus::Success, Some(0), None)
            .expect("end");

        let second = store
            .record_run_start("backup", "2026-01-02T00:00:00+00:00", None, None)
            .expect("start");
        store
            .record_run_end(second, "2026-01-02T00:00:05+00:00", RunStatus::Failed, Some(1), None)
            .expect("end");

        let runs = store.recent_runs(10, None).expect("runs");
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].id, second);
        assert_eq!(runs[0].status, RunStatus::Failed);
        assert_eq!(runs[1].exit_code, Some(0));

        let limited = store.recent_runs(1, None).expect("runs");
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].id, second);
    }

    #[test]
    fn run_history_filters_by_task_name() {
        let store = store();
        store
            .record_run_start("backup", "2026-01-01T00:00:00+00:00", None, None)
            .expect("start");
        store
            .record_run_start("cleanup", "2026-01-01T01:00:00+00:00", None, None)
            .expect("start");

        let runs = store.recent_runs(10, Some("cleanup")).expect("runs");
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].task_name, "cleanup");
    }
}
