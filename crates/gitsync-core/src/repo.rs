//! Per-repository synchronization state machine.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use gitsync_config::{Config, RepoConfig};
use gitsync_exec::{CommandSpec, merge_errors};
use gitsync_git::{GitBackend, GitResult, SyncRequest};
use tracing::{debug, info, warn};

use crate::{HookConfig, RepoUrl, SyncError, SyncResult};

/// Minimum time between two pulls of the same repository.
pub const MIN_PULL_SPACING: Duration = Duration::from_secs(5);

/// Number of attempts made by a single [`Repo::pull`].
pub const NUM_RETRIES: usize = 3;

/// Interval used when none is configured.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(3600);

/// What a call to [`Repo::pull`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullOutcome {
    /// The previous pull was too recent; nothing was done.
    RateLimited,
    /// The remote had nothing new.
    UpToDate,
    /// The checkout moved to `commit` and the post-update commands ran.
    Updated {
        /// The new head commit.
        commit: String,
    },
}

impl fmt::Display for PullOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimited => f.write_str("skipped, previous pull was too recent"),
            Self::UpToDate => f.write_str("No new changes."),
            Self::Updated { commit } => write!(f, "updated to {commit}"),
        }
    }
}

#[derive(Debug, Default)]
struct PullState {
    has_cloned: bool,
    last_pull: Option<Instant>,
    last_commit: Option<String>,
}

/// A remote repository kept in sync with a local directory.
///
/// Configuration is fixed at construction. The pull state lives behind a
/// mutex that [`Repo::pull`] holds for its whole duration, so pulls of one
/// repository never overlap.
pub struct Repo {
    url: RepoUrl,
    path: PathBuf,
    branch: String,
    token: Option<String>,
    interval: Duration,
    commands: Vec<CommandSpec>,
    hook: Option<HookConfig>,
    min_pull_spacing: Duration,
    backend: Arc<dyn GitBackend>,
    state: Mutex<PullState>,
}

impl Repo {
    /// Starts building a repository cloned from `url` into `path`.
    #[must_use]
    pub fn builder(
        url: impl Into<RepoUrl>,
        path: impl Into<PathBuf>,
        backend: Arc<dyn GitBackend>,
    ) -> RepoBuilder {
        RepoBuilder {
            url: url.into(),
            path: path.into(),
            backend,
            branch: gitsync_config::DEFAULT_BRANCH.to_string(),
            token: None,
            interval: DEFAULT_INTERVAL,
            commands: Vec::new(),
            hook: None,
            min_pull_spacing: MIN_PULL_SPACING,
        }
    }

    /// Builds a repository from one `[[repo]]` entry.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Configuration`] if the URL or hook type is invalid.
    pub fn from_config(
        config: &Config,
        repo: &RepoConfig,
        backend: Arc<dyn GitBackend>,
    ) -> SyncResult<Self> {
        let url = RepoUrl::parse(&repo.url)?;

        let hook = match &repo.hook {
            Some(hook) => Some(HookConfig {
                url: hook.url.clone(),
                secret: hook.secret.clone(),
                hook_type: hook.hook_type.parse()?,
            }),
            None => None,
        };

        let commands = repo.then.iter().map(|then| {
            if then.long {
                CommandSpec::detached(&then.command, &then.args)
            } else {
                CommandSpec::new(&then.command, &then.args)
            }
        });

        let mut builder = Repo::builder(url, config.clone_path(repo), backend)
            .branch(&repo.branch)
            .interval(Duration::from_secs(repo.interval_secs()))
            .commands(commands);
        if let Some(token) = &repo.auth_token {
            builder = builder.token(token);
        }
        if let Some(hook) = hook {
            builder = builder.hook(hook);
        }

        Ok(builder.build())
    }

    /// Returns the remote URL.
    #[must_use]
    pub fn url(&self) -> &RepoUrl {
        &self.url
    }

    /// Returns the local checkout directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the tracked branch.
    #[must_use]
    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Returns the polling interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns the commands run after each update, in order.
    #[must_use]
    pub fn commands(&self) -> &[CommandSpec] {
        &self.commands
    }

    /// Returns the webhook settings, if any.
    #[must_use]
    pub fn hook(&self) -> Option<&HookConfig> {
        self.hook.as_ref()
    }

    /// Whether pulls are triggered by webhooks instead of polling.
    #[must_use]
    pub fn is_webhook_driven(&self) -> bool {
        self.hook.is_some()
    }

    /// Returns the final component of the local path.
    #[must_use]
    pub fn name(&self) -> String {
        self.path.file_name().map_or_else(
            || self.path.display().to_string(),
            |name| name.to_string_lossy().into_owned(),
        )
    }

    /// Whether a checkout exists locally.
    #[must_use]
    pub fn has_cloned(&self) -> bool {
        self.lock_state().has_cloned
    }

    /// Returns when the last successful pull finished.
    #[must_use]
    pub fn last_pull(&self) -> Option<Instant> {
        self.lock_state().last_pull
    }

    /// Returns the head commit seen by the last successful pull.
    #[must_use]
    pub fn last_commit(&self) -> Option<String> {
        self.lock_state().last_commit.clone()
    }

    /// Checks that the local path can hold this repository.
    ///
    /// A missing or empty directory is created. A directory holding a
    /// checkout of this repository is adopted, so the next pull fetches
    /// instead of cloning. Calling this again has no further effect.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::DirtyDirectory`] if the directory holds anything
    /// but a checkout, [`SyncError::Conflict`] if the checkout belongs to
    /// another repository and [`SyncError::OriginUnavailable`] if its origin
    /// cannot be read.
    pub fn prepare(&self) -> SyncResult<()> {
        let mut state = self.lock_state();

        let entries = match fs::read_dir(&self.path) {
            Ok(dir) => dir.collect::<Result<Vec<_>, _>>()?,
            Err(_) => Vec::new(),
        };

        if entries.is_empty() {
            fs::create_dir_all(&self.path)?;
            debug!(path = %self.path.display(), "clone target ready");
            return Ok(());
        }

        let has_git_dir = entries
            .iter()
            .any(|entry| entry.file_name() == ".git" && entry.path().is_dir());
        if !has_git_dir {
            return Err(SyncError::DirtyDirectory(self.path.clone()));
        }

        let existing =
            self.backend
                .origin_url(&self.path)
                .map_err(|source| SyncError::OriginUnavailable {
                    path: self.path.clone(),
                    source,
                })?;

        if trim_git_suffix(&existing) != trim_git_suffix(self.url.val()) {
            return Err(SyncError::Conflict {
                existing,
                path: self.path.clone(),
            });
        }

        state.has_cloned = true;
        debug!(path = %self.path.display(), url = %self.url, "adopted existing checkout");
        Ok(())
    }

    /// Brings the checkout up to date and runs the post-update commands if
    /// the head commit moved.
    ///
    /// Returns [`PullOutcome::RateLimited`] without doing anything when the
    /// previous successful pull is less than [`MIN_PULL_SPACING`] old.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Git`] with the last failure once all
    /// [`NUM_RETRIES`] attempts failed, or [`SyncError::Commands`] if any
    /// post-update command failed.
    pub fn pull(&self) -> SyncResult<PullOutcome> {
        let mut state = self.lock_state();

        if let Some(last) = state.last_pull
            && last.elapsed() < self.min_pull_spacing
        {
            debug!(url = %self.url, "pull skipped, too soon after the previous one");
            return Ok(PullOutcome::RateLimited);
        }

        let previous = state.last_commit.clone();

        let mut attempt = 1;
        while let Err(err) = self.sync(&mut state) {
            warn!(url = %self.url, attempt, error = %err, "pull attempt failed");
            if attempt == NUM_RETRIES {
                return Err(err.into());
            }
            attempt += 1;
        }

        match &state.last_commit {
            Some(commit) if state.last_commit != previous => {
                info!("{} pulled.", self.url);
                let commit = commit.clone();
                self.run_commands()?;
                Ok(PullOutcome::Updated { commit })
            }
            _ => {
                info!("No new changes.");
                Ok(PullOutcome::UpToDate)
            }
        }
    }

    /// Hard-checks out `commit`, leaving HEAD detached.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Git`] if the commit is unknown or the checkout
    /// fails.
    pub fn checkout_commit(&self, commit: &str) -> SyncResult<()> {
        let _state = self.lock_state();
        self.backend.checkout_commit(&self.path, commit)?;
        info!(url = %self.url, commit, "checked out commit");
        Ok(())
    }

    /// One clone or pull attempt. Updates the state only on success.
    fn sync(&self, state: &mut PullState) -> GitResult<()> {
        let request = SyncRequest {
            url: self.url.val(),
            path: &self.path,
            branch: &self.branch,
            token: self.token.as_deref(),
        };

        let head = if state.has_cloned {
            self.backend.pull(&request)?
        } else {
            self.backend.clone_repo(&request)?
        };

        state.has_cloned = true;
        state.last_pull = Some(Instant::now());
        state.last_commit = Some(head);
        Ok(())
    }

    fn run_commands(&self) -> SyncResult<()> {
        let failures = self
            .commands
            .iter()
            .map(|command| command.exec(&self.path).err());
        match merge_errors(failures) {
            Some(errors) => Err(SyncError::Commands(errors)),
            None => Ok(()),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, PullState> {
        // A panic mid-pull leaves the state as it was before the failed step.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Repo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repo")
            .field("url", &self.url.to_string())
            .field("path", &self.path)
            .field("branch", &self.branch)
            .field("interval", &self.interval)
            .field("commands", &self.commands)
            .field("hook", &self.hook.as_ref().map(|hook| &hook.url))
            .finish_non_exhaustive()
    }
}

fn trim_git_suffix(url: &str) -> &str {
    url.strip_suffix(".git").unwrap_or(url)
}

/// Builder for [`Repo`].
#[must_use]
pub struct RepoBuilder {
    url: RepoUrl,
    path: PathBuf,
    backend: Arc<dyn GitBackend>,
    branch: String,
    token: Option<String>,
    interval: Duration,
    commands: Vec<CommandSpec>,
    hook: Option<HookConfig>,
    min_pull_spacing: Duration,
}

impl RepoBuilder {
    /// Sets the tracked branch.
    pub fn branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    /// Sets the token sent as a basic-auth password.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets the polling interval. A zero interval keeps the default.
    pub fn interval(mut self, interval: Duration) -> Self {
        if !interval.is_zero() {
            self.interval = interval;
        }
        self
    }

    /// Appends a post-update command.
    pub fn command(mut self, command: CommandSpec) -> Self {
        self.commands.push(command);
        self
    }

    /// Appends several post-update commands.
    pub fn commands(mut self, commands: impl IntoIterator<Item = CommandSpec>) -> Self {
        self.commands.extend(commands);
        self
    }

    /// Makes the repository webhook-driven.
    pub fn hook(mut self, hook: HookConfig) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Overrides [`MIN_PULL_SPACING`].
    pub fn min_pull_spacing(mut self, spacing: Duration) -> Self {
        self.min_pull_spacing = spacing;
        self
    }

    /// Finishes the repository. It still needs [`Repo::prepare`] before the
    /// first pull.
    #[must_use]
    pub fn build(self) -> Repo {
        Repo {
            url: self.url,
            path: self.path,
            branch: self.branch,
            token: self.token,
            interval: self.interval,
            commands: self.commands,
            hook: self.hook,
            min_pull_spacing: self.min_pull_spacing,
            backend: self.backend,
            state: Mutex::new(PullState::default()),
        }
    }
}
