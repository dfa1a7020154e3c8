//! Background polling of repositories.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::{PullOutcome, Repo, SyncError, SyncResult};

/// Keeps polling repositories that are not driven by webhooks.
///
/// Each polled repository gets its own task; the tasks never talk to each
/// other. Dropping the scheduler leaves them running, use
/// [`Scheduler::shutdown`] to stop them.
#[derive(Debug)]
pub struct Scheduler {
    loops: Vec<JoinHandle<()>>,
}

impl Scheduler {
    /// Pulls every repository once, then starts one polling loop for each
    /// repository without a webhook.
    ///
    /// Startup pull failures are logged and do not stop the scheduler.
    pub async fn start(repos: &[Arc<Repo>]) -> Self {
        for repo in repos {
            if let Err(err) = pull_blocking(Arc::clone(repo)).await {
                error!(url = %repo.url(), error = %err, "startup pull failed");
            }
        }

        let loops = repos
            .iter()
            .filter(|repo| !repo.is_webhook_driven())
            .map(|repo| tokio::spawn(poll(Arc::clone(repo))))
            .collect();

        Self { loops }
    }

    /// Returns the number of polling loops.
    #[must_use]
    pub fn len(&self) -> usize {
        self.loops.len()
    }

    /// Whether no repository is polled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }

    /// Stops every polling loop. A pull already running finishes on its own.
    pub fn shutdown(self) {
        for handle in self.loops {
            handle.abort();
        }
    }
}

async fn poll(repo: Arc<Repo>) {
    let interval = repo.interval();
    debug!(url = %repo.url(), ?interval, "polling started");

    loop {
        tokio::time::sleep(interval).await;
        if let Err(err) = pull_blocking(Arc::clone(&repo)).await {
            error!(url = %repo.url(), error = %err, "scheduled pull failed");
        }
    }
}

/// Runs [`Repo::pull`] on the blocking pool.
///
/// # Errors
///
/// Returns the pull error, or [`SyncError::Io`] if the pull task panicked.
pub async fn pull_blocking(repo: Arc<Repo>) -> SyncResult<PullOutcome> {
    tokio::task::spawn_blocking(move || repo.pull())
        .await
        .map_err(|err| SyncError::Io(std::io::Error::other(err)))?
}
