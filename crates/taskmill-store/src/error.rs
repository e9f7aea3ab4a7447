use thiserror::Error;

/// Errors that can occur within the task store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying SQLite / rusqlite error.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A task with this name already exists.
    #[error("task already exists: {name}")]
    DuplicateName { name: String },

    /// No task with the given name exists in the store.
    #[error("task not found: {name}")]
    TaskNotFound { name: String },

    /// The cron expression does not parse under 5-field semantics.
    #[error("invalid cron expression '{expr}': {reason}")]
    InvalidCron { expr: String, reason: String },
}

pub type Result<T> = std::result::Result<T, StoreError>;
