use rusqlite::Connection;

use crate::error::Result;

/// Initialise the task and run-history schema in `conn`.
///
/// Idempotent — safe to call on every startup. The `runs` index keeps the
/// newest-first history query cheap as history accumulates.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS tasks (
            name        TEXT    NOT NULL PRIMARY KEY,
            script_path TEXT    NOT NULL,
            interpreter TEXT,               -- NULL: configured default applies
            working_dir TEXT,
            cron        TEXT    NOT NULL,   -- 5-field expression
            enabled     INTEGER NOT NULL DEFAULT 1,
            created_at  TEXT    NOT NULL,
            updated_at  TEXT    NOT NULL
        ) STRICT;

        CREATE TABLE IF NOT EXISTS runs (
            id          INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
            task_name   TEXT    NOT NULL,
            started_at  TEXT    NOT NULL,   -- ISO-8601
            finished_at TEXT,               -- ISO-8601 or NULL while running
            status      TEXT    NOT NULL DEFAULT 'running',
            exit_code   INTEGER,
            stdout_path TEXT,
            stderr_path TEXT,
            message     TEXT                -- spawn-failure detail
        ) STRICT;

        CREATE INDEX IF NOT EXISTS idx_runs_started_at ON runs (started_at);
        ",
    )?;
    Ok(())
}
