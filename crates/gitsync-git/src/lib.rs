//! Git abstraction layer for gitsync.
//!
//! This crate provides Git operations:
//! - Cloning a branch (with submodules)
//! - Fetching and fast-forwarding or merging the tracked branch
//! - Checking out an explicit commit
//! - Reading the `origin` remote of an existing checkout
//!
//! [`GitBackend`] is the seam the synchronization engine talks to;
//! [`Git2Backend`] is the libgit2 implementation.

mod auth;
mod backend;
mod error;
mod repository;

pub use auth::AUTH_USERNAME;
pub use backend::{Git2Backend, GitBackend, SyncRequest};
pub use error::{GitError, GitResult};
pub use repository::Repository;
