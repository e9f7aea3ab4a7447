use thiserror::Error;

/// Errors raised by configuration loading and the self-updater.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),

    /// The `git` executable could not be found on PATH.
    #[error("the 'git' command is not available on this system")]
    GitUnavailable,

    #[error("{path} is not a git repository")]
    NotARepository { path: String },

    /// The checkout has uncommitted changes and --force was not given.
    #[error("the repository has local changes; pass --force to discard them")]
    DirtyWorkTree,

    /// A git subcommand exited non-zero; carries its combined output.
    #[error("git command failed: {0}")]
    Git(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
