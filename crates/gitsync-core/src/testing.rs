//! Shared test utilities.

use std::io;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use gitsync_git::{GitBackend, GitError, GitResult, SyncRequest};

/// In-memory backend whose remote head and failures are set by the test.
#[derive(Debug)]
pub(crate) struct ScriptedBackend {
    head: Mutex<String>,
    origin: Mutex<Option<String>>,
    failures: AtomicUsize,
    clones: AtomicUsize,
    pulls: AtomicUsize,
}

impl ScriptedBackend {
    pub(crate) fn new(head: &str) -> Self {
        Self {
            head: Mutex::new(head.to_string()),
            origin: Mutex::new(None),
            failures: AtomicUsize::new(0),
            clones: AtomicUsize::new(0),
            pulls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_origin(self, origin: &str) -> Self {
        *self.origin.lock().unwrap() = Some(origin.to_string());
        self
    }

    pub(crate) fn set_head(&self, head: &str) {
        *self.head.lock().unwrap() = head.to_string();
    }

    /// Makes the next `count` clone or pull calls fail.
    pub(crate) fn fail_next(&self, count: usize) {
        self.failures.store(count, Ordering::SeqCst);
    }

    pub(crate) fn clones(&self) -> usize {
        self.clones.load(Ordering::SeqCst)
    }

    pub(crate) fn pulls(&self) -> usize {
        self.pulls.load(Ordering::SeqCst)
    }

    pub(crate) fn attempts(&self) -> usize {
        self.clones() + self.pulls()
    }

    fn remote_head(&self) -> GitResult<String> {
        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(GitError::Io(io::Error::other("network unreachable")));
        }
        Ok(self.head.lock().unwrap().clone())
    }
}

impl GitBackend for ScriptedBackend {
    fn clone_repo(&self, _request: &SyncRequest<'_>) -> GitResult<String> {
        self.clones.fetch_add(1, Ordering::SeqCst);
        self.remote_head()
    }

    fn pull(&self, _request: &SyncRequest<'_>) -> GitResult<String> {
        self.pulls.fetch_add(1, Ordering::SeqCst);
        self.remote_head()
    }

    fn checkout_commit(&self, _path: &Path, commit: &str) -> GitResult<()> {
        if commit.is_empty() {
            return Err(GitError::InvalidCommit(commit.to_string()));
        }
        Ok(())
    }

    fn origin_url(&self, path: &Path) -> GitResult<String> {
        self.origin
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| GitError::NoOrigin(path.to_path_buf()))
    }
}
