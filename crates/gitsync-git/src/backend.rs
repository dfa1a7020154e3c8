//! The git operations the synchronization engine depends on.

use std::path::Path;

use tracing::debug;

use crate::{GitError, GitResult, Repository};

/// What to clone or pull, and with which credentials.
#[derive(Debug, Clone, Copy)]
pub struct SyncRequest<'a> {
    /// Remote URL in the form accepted by the clone primitive.
    pub url: &'a str,
    /// Local checkout directory.
    pub path: &'a Path,
    /// Tracked branch.
    pub branch: &'a str,
    /// Optional auth token, sent as a basic-auth password.
    pub token: Option<&'a str>,
}

/// Git operations used to keep a working directory in sync.
///
/// Implementations must be shareable across threads: every repository holds
/// the same backend and pulls run in parallel.
pub trait GitBackend: Send + Sync {
    /// Clones the requested branch and returns the checked-out commit id.
    ///
    /// # Errors
    ///
    /// Returns an error if the clone fails.
    fn clone_repo(&self, request: &SyncRequest<'_>) -> GitResult<String>;

    /// Updates an existing checkout and returns the resulting commit id.
    ///
    /// # Errors
    ///
    /// Returns an error if fetching or merging fails.
    fn pull(&self, request: &SyncRequest<'_>) -> GitResult<String>;

    /// Hard-checks out `commit` in the checkout at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit is unknown or the checkout fails.
    fn checkout_commit(&self, path: &Path, commit: &str) -> GitResult<()>;

    /// Returns the `origin` URL of the checkout at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is not a checkout or has no origin.
    fn origin_url(&self, path: &Path) -> GitResult<String>;
}

/// libgit2-backed [`GitBackend`].
///
/// Created once at startup through [`Git2Backend::init`], which verifies the
/// linked libgit2 can serve concurrent network operations.
#[derive(Debug, Clone)]
pub struct Git2Backend {
    libgit2_version: (u32, u32, u32),
}

impl Git2Backend {
    /// Probes the linked libgit2 and returns a handle to it.
    ///
    /// # Errors
    ///
    /// Returns [`GitError::Unsupported`] if libgit2 was built without thread
    /// safety or without any network transport.
    pub fn init() -> GitResult<Self> {
        let version = git2::Version::get();

        if !version.threads() {
            return Err(GitError::Unsupported(
                "libgit2 was built without thread support".to_string(),
            ));
        }
        if !version.https() && !version.ssh() {
            return Err(GitError::Unsupported(
                "libgit2 was built without HTTPS or SSH transports".to_string(),
            ));
        }

        let libgit2_version = version.libgit2_version();
        debug!(
            libgit2 = ?libgit2_version,
            https = version.https(),
            ssh = version.ssh(),
            "git backend ready"
        );

        Ok(Self { libgit2_version })
    }

    /// Returns the linked libgit2 version as `(major, minor, patch)`.
    #[must_use]
    pub fn libgit2_version(&self) -> (u32, u32, u32) {
        self.libgit2_version
    }
}

impl GitBackend for Git2Backend {
    fn clone_repo(&self, request: &SyncRequest<'_>) -> GitResult<String> {
        let repo =
            Repository::clone_branch(request.url, request.path, request.branch, request.token)?;
        repo.head_commit()
    }

    fn pull(&self, request: &SyncRequest<'_>) -> GitResult<String> {
        let repo = Repository::open(request.path)?;
        repo.pull(request.branch, request.token)?;
        repo.head_commit()
    }

    fn checkout_commit(&self, path: &Path, commit: &str) -> GitResult<()> {
        Repository::open(path)?.checkout_commit(commit)
    }

    fn origin_url(&self, path: &Path) -> GitResult<String> {
        Repository::open(path)?.origin_url()
    }
}
