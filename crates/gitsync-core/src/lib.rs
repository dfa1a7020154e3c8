//! Repository synchronization engine for gitsync.
//!
//! A [`Repo`] keeps one local directory in sync with a remote branch and runs
//! post-update commands whenever the head commit moves. The [`Scheduler`]
//! polls repositories on their interval; webhook-driven repositories are
//! pulled by the webhook dispatcher instead.

mod error;
mod hook;
mod repo;
mod repo_url;
mod scheduler;

#[cfg(test)]
mod testing;

pub use error::{SyncError, SyncResult};
pub use hook::{HookConfig, HookType};
pub use repo::{
    DEFAULT_INTERVAL, MIN_PULL_SPACING, NUM_RETRIES, PullOutcome, Repo, RepoBuilder,
};
pub use repo_url::RepoUrl;
pub use scheduler::{Scheduler, pull_blocking};
