use std::{io, path::PathBuf, result::Result as StdResult};
use thiserror::Error;

/// Custom Result type for stashmark operations.
pub type Result<T> = StdResult<T, StashmarkError>;

/// Stashmark-specific error types
#[derive(Error, Debug)]
pub enum StashmarkError {
    /// A git command ran but exited unsuccessfully.
    #[error("Git command failed: {command}\nError: {message}")]
    GitError {
        /// The command line that was executed.
        command: String,
        /// Trimmed diagnostic output from the command.
        message: String,
    },

    /// The git binary could not be launched at all.
    #[error("Failed to execute git command: {command}")]
    GitSpawn {
        /// The command line that was attempted.
        command: String,
        /// The underlying launch failure.
        #[source]
        source: io::Error,
    },

    /// Creating a stash entry produced diagnostic output.
    #[error("{0}")]
    StashCreation(String),

    /// No stash entry with the given object id exists.
    #[error("No stash entry found for {sha}")]
    EntryNotFound {
        /// The stash commit id that was looked up.
        sha: String,
    },

    /// The persisted preference file could not be read or written.
    #[error("Preferences error ({path}): {message}")]
    Preferences {
        /// Path of the preference file.
        path: PathBuf,
        /// Human-readable error description.
        message: String,
    },

    /// A contextual precondition failed (e.g. not inside a Git repo).
    #[error("Context error: {0}")]
    ContextError(String),

    /// An underlying I/O operation failed.
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

impl StashmarkError {
    /// Return the recommended process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::EntryNotFound { .. } => 2,
            Self::StashCreation(_) => 3,
            Self::GitError { .. } | Self::GitSpawn { .. } => 4,
            _ => 1,
        }
    }
}
