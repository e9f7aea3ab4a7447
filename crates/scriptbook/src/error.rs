use thiserror::Error;

/// Errors raised by the script file store and editor.
#[derive(Debug, Error)]
pub enum BookError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed script file: {0}")]
    Json(#[from] serde_json::Error),

    /// An entry with this name (case-insensitive) already exists.
    #[error("script '{name}' already exists")]
    DuplicateName { name: String },

    /// A required form field was left empty.
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    /// Delete targeted an index past the end of the list.
    #[error("no script at position {index}")]
    BadIndex { index: usize },
}

pub type Result<T> = std::result::Result<T, BookError>;
