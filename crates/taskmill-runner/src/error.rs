use thiserror::Error;

/// Errors raised while executing a task.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Task lookup or run-record persistence failed.
    #[error(transparent)]
    Store(#[from] taskmill_store::StoreError),

    /// The interpreter could not be spawned (missing binary, unreadable
    /// script, bad working directory).
    #[error("failed to spawn task '{task}': {source}")]
    Spawn {
        task: String,
        #[source]
        source: std::io::Error,
    },

    /// Log-directory or log-file creation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RunnerError>;
