//! Synchronization error types.

use std::path::PathBuf;

use gitsync_exec::ExecErrors;
use gitsync_git::GitError;
use thiserror::Error;

/// Errors raised while preparing or synchronizing a repository.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The clone target holds files but no git checkout.
    #[error("cannot git clone into {0}, directory not empty")]
    DirtyDirectory(PathBuf),

    /// The clone target holds a checkout of a different repository.
    #[error("another git repo '{existing}' exists at {path}")]
    Conflict {
        /// Origin URL of the checkout found on disk.
        existing: String,
        /// The clone target.
        path: PathBuf,
    },

    /// The checkout on disk has no readable origin.
    #[error("cannot retrieve repo url for {path}: {source}")]
    OriginUnavailable {
        /// The clone target.
        path: PathBuf,
        /// Why the origin could not be read.
        #[source]
        source: GitError,
    },

    /// Clone or pull kept failing after every retry.
    #[error(transparent)]
    Git(#[from] GitError),

    /// One or more post-update commands failed.
    #[error(transparent)]
    Commands(#[from] ExecErrors),

    /// Invalid repository settings.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for synchronization operations.
pub type SyncResult<T> = Result<T, SyncError>;
