//! Git error types.

use thiserror::Error;

/// Git-related errors.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not a git repository.
    #[error("not a git repository: {0}")]
    NotARepo(std::path::PathBuf),

    /// The checkout has no usable `origin` remote.
    #[error("no origin remote configured in {0}")]
    NoOrigin(std::path::PathBuf),

    /// The tracked branch does not exist on the remote.
    #[error("branch not found on origin: {0}")]
    BranchNotFound(String),

    /// The given string is not a commit id, or names no commit.
    #[error("invalid commit: {0}")]
    InvalidCommit(String),

    /// Local and remote histories diverged and cannot be merged cleanly.
    #[error("merge conflict while pulling branch {0}")]
    MergeConflict(String),

    /// The linked libgit2 lacks a required capability.
    #[error("unsupported libgit2 build: {0}")]
    Unsupported(String),

    /// Git2 error.
    #[error("git error: {0}")]
    Git2(#[from] git2::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for git operations.
pub type GitResult<T> = Result<T, GitError>;
