//! Git repository wrapper.

use std::fs;
use std::path::Path;

use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{Oid, Repository as Git2Repo, Signature, SubmoduleUpdateOptions};
use tracing::{debug, warn};

use crate::auth::{AUTH_USERNAME, fetch_options};
use crate::{GitError, GitResult};

/// Name of the remote every checkout tracks.
const ORIGIN: &str = "origin";

/// How deep nested submodules are followed after a clone.
const SUBMODULE_RECURSION_DEPTH: u32 = 10;

/// A Git repository wrapper.
pub struct Repository {
    inner: Git2Repo,
}

impl Repository {
    /// Opens a repository at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not a valid Git repository.
    pub fn open(path: impl AsRef<Path>) -> GitResult<Self> {
        let path = path.as_ref();
        let inner = Git2Repo::open(path).map_err(|_| GitError::NotARepo(path.to_path_buf()))?;
        Ok(Self { inner })
    }

    /// Clones `branch` of `url` into `path`, then initializes submodules.
    ///
    /// `path` must be missing or empty. When any step fails its contents are
    /// removed again, so a later attempt can clone into it.
    ///
    /// # Errors
    ///
    /// Returns an error if the clone or a submodule update fails.
    pub fn clone_branch(
        url: &str,
        path: impl AsRef<Path>,
        branch: &str,
        token: Option<&str>,
    ) -> GitResult<Self> {
        let path = path.as_ref();
        debug!(?path, branch, "cloning repository");

        let mut builder = RepoBuilder::new();
        builder.branch(branch);
        builder.fetch_options(fetch_options(token));
        let cloned = builder
            .clone(url, path)
            .map_err(GitError::from)
            .and_then(|inner| {
                update_submodules(&inner, token, SUBMODULE_RECURSION_DEPTH)?;
                Ok(inner)
            });

        match cloned {
            Ok(inner) => Ok(Self { inner }),
            Err(err) => {
                clear_dir(path);
                Err(err)
            }
        }
    }

    /// Returns the repository root path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.inner.workdir().unwrap_or_else(|| self.inner.path())
    }

    /// Returns the id of the commit HEAD points at.
    ///
    /// # Errors
    ///
    /// Returns an error if HEAD is unborn or cannot be resolved.
    pub fn head_commit(&self) -> GitResult<String> {
        let commit = self.inner.head()?.peel_to_commit()?;
        Ok(commit.id().to_string())
    }

    /// Returns the URL of the `origin` remote.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no `origin` remote or its URL is not UTF-8.
    pub fn origin_url(&self) -> GitResult<String> {
        let remote = self
            .inner
            .find_remote(ORIGIN)
            .map_err(|_| GitError::NoOrigin(self.path().to_path_buf()))?;
        remote
            .url()
            .map(str::to_owned)
            .ok_or_else(|| GitError::NoOrigin(self.path().to_path_buf()))
    }

    /// Fetches `branch` from `origin` and brings the local branch up to date.
    ///
    /// Fast-forwards when possible and creates a merge commit when the
    /// histories diverged without conflicts. Being already up to date is not
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the fetch fails, the branch is missing on the
    /// remote, or the merge conflicts.
    pub fn pull(&self, branch: &str, token: Option<&str>) -> GitResult<()> {
        let mut remote = self
            .inner
            .find_remote(ORIGIN)
            .map_err(|_| GitError::NoOrigin(self.path().to_path_buf()))?;

        let tracking_ref = format!("refs/remotes/{ORIGIN}/{branch}");
        let refspec = format!("+refs/heads/{branch}:{tracking_ref}");
        remote.fetch(&[refspec.as_str()], Some(&mut fetch_options(token)), None)?;

        let remote_id = self
            .inner
            .find_reference(&tracking_ref)
            .and_then(|r| r.peel_to_commit())
            .map_err(|_| GitError::BranchNotFound(branch.to_string()))?
            .id();

        let annotated = self.inner.find_annotated_commit(remote_id)?;
        let (analysis, _) = self.inner.merge_analysis(&[&annotated])?;

        if analysis.is_up_to_date() {
            debug!(branch, "already up to date");
            return Ok(());
        }

        if analysis.is_fast_forward() || analysis.is_unborn() {
            return self.fast_forward(branch, remote_id);
        }

        self.merge(branch, remote_id)
    }

    /// Hard-checks out an explicit commit, leaving HEAD detached.
    ///
    /// # Errors
    ///
    /// Returns an error if `commit` does not name a commit or the checkout fails.
    pub fn checkout_commit(&self, commit: &str) -> GitResult<()> {
        let target = self
            .inner
            .revparse_single(commit)
            .and_then(|object| object.peel_to_commit())
            .map_err(|_| GitError::InvalidCommit(commit.to_string()))?;

        let mut checkout = CheckoutBuilder::new();
        checkout.force();
        self.inner
            .checkout_tree(target.as_object(), Some(&mut checkout))?;
        self.inner.set_head_detached(target.id())?;
        Ok(())
    }

    fn fast_forward(&self, branch: &str, target: Oid) -> GitResult<()> {
        let commit = self.inner.find_commit(target)?;

        // Update the working tree first so the checkout baseline is the old HEAD.
        let mut checkout = CheckoutBuilder::new();
        checkout.safe();
        self.inner
            .checkout_tree(commit.as_object(), Some(&mut checkout))?;

        let local_ref = format!("refs/heads/{branch}");
        let message = format!("gitsync: fast-forward {branch} to {target}");
        match self.inner.find_reference(&local_ref) {
            Ok(mut reference) => {
                reference.set_target(target, &message)?;
            }
            Err(_) => {
                self.inner.reference(&local_ref, target, true, &message)?;
            }
        }
        self.inner.set_head(&local_ref)?;

        debug!(branch, %target, "fast-forwarded");
        Ok(())
    }

    fn merge(&self, branch: &str, theirs: Oid) -> GitResult<()> {
        let ours = self.inner.head()?.peel_to_commit()?;
        let theirs = self.inner.find_commit(theirs)?;

        let mut index = self.inner.merge_commits(&ours, &theirs, None)?;
        if index.has_conflicts() {
            return Err(GitError::MergeConflict(branch.to_string()));
        }

        let tree_id = index.write_tree_to(&self.inner)?;
        let tree = self.inner.find_tree(tree_id)?;

        let mut checkout = CheckoutBuilder::new();
        checkout.safe();
        self.inner.checkout_tree(tree.as_object(), Some(&mut checkout))?;

        let signature = self
            .inner
            .signature()
            .or_else(|_| Signature::now(AUTH_USERNAME, "gitsync@localhost"))?;
        let message = format!("Merge branch '{branch}' of {ORIGIN}");
        let merge_id = self.inner.commit(
            Some("HEAD"),
            &signature,
            &signature,
            &message,
            &tree,
            &[&ours, &theirs],
        )?;

        debug!(branch, %merge_id, "merged remote changes");
        Ok(())
    }
}

/// Removes everything inside `path`, keeping the directory itself.
fn clear_dir(path: &Path) {
    let Ok(entries) = fs::read_dir(path) else {
        return;
    };
    for entry in entries.flatten() {
        let entry_path = entry.path();
        let removed = if entry.file_type().is_ok_and(|kind| kind.is_dir()) {
            fs::remove_dir_all(&entry_path)
        } else {
            fs::remove_file(&entry_path)
        };
        if let Err(err) = removed {
            warn!(path = ?entry_path, error = %err, "cannot remove leftover of failed clone");
        }
    }
}

fn update_submodules(repo: &Git2Repo, token: Option<&str>, depth: u32) -> GitResult<()> {
    if depth == 0 {
        return Ok(());
    }

    for mut submodule in repo.submodules()? {
        debug!(name = submodule.name().unwrap_or(""), "updating submodule");
        let mut options = SubmoduleUpdateOptions::new();
        options.fetch(fetch_options(token));
        submodule.update(true, Some(&mut options))?;

        let nested = submodule.open()?;
        update_submodules(&nested, token, depth - 1)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::RepositoryInitOptions;
    use std::fs;
    use tempfile::TempDir;

    fn create_upstream() -> (TempDir, Git2Repo) {
        let temp_dir = TempDir::new().unwrap();
        let mut options = RepositoryInitOptions::new();
        options.initial_head("main");
        let repo = Git2Repo::init_opts(temp_dir.path(), &options).unwrap();

        // Configure user for commits
        let mut config = repo.config().unwrap();
        config.set_str("user.name", "Test User").unwrap();
        config.set_str("user.email", "test@example.com").unwrap();

        commit_file(&repo, "README.md", "hello\n", "Initial commit");
        (temp_dir, repo)
    }

    fn commit_file(repo: &Git2Repo, name: &str, content: &str, message: &str) -> Oid {
        let workdir = repo.workdir().unwrap();
        fs::write(workdir.join(name), content).unwrap();

        let mut index = repo.index().unwrap();
        index.add_path(Path::new(name)).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();

        let sig = Signature::now("Test User", "test@example.com").unwrap();
        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap()
    }

    fn add_submodule(repo: &Git2Repo, source: &Path) {
        let mut submodule = repo
            .submodule(source.to_str().unwrap(), Path::new("sub"), true)
            .unwrap();
        submodule.clone(None).unwrap();
        submodule.add_finalize().unwrap();

        let mut index = repo.index().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = Signature::now("Test User", "test@example.com").unwrap();
        let parent = repo.head().unwrap().peel_to_commit().unwrap();
        repo.commit(Some("HEAD"), &sig, &sig, "Add submodule", &tree, &[&parent])
            .unwrap();
    }

    fn url_of(dir: &TempDir) -> String {
        dir.path().to_str().unwrap().to_string()
    }

    fn clone_upstream(upstream: &TempDir) -> (TempDir, Repository) {
        let target = TempDir::new().unwrap();
        let repo = Repository::clone_branch(&url_of(upstream), target.path(), "main", None)
            .unwrap();
        (target, repo)
    }

    #[test]
    fn test_open_invalid_path() {
        let result = Repository::open("/nonexistent/path/to/repo");
        assert!(matches!(result, Err(GitError::NotARepo(_))));
    }

    #[test]
    fn test_open_not_a_repo() {
        let temp_dir = TempDir::new().unwrap();
        let result = Repository::open(temp_dir.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_clone_checks_out_branch() {
        let (upstream_dir, upstream) = create_upstream();
        let (target, repo) = clone_upstream(&upstream_dir);

        assert!(target.path().join("README.md").exists());
        assert_eq!(
            repo.head_commit().unwrap(),
            upstream.head().unwrap().target().unwrap().to_string()
        );
    }

    #[test]
    fn test_clone_unknown_branch_fails() {
        let (upstream_dir, _upstream) = create_upstream();
        let target = TempDir::new().unwrap();
        let result =
            Repository::clone_branch(&url_of(&upstream_dir), target.path(), "develop", None);
        assert!(result.is_err());
    }

    #[test]
    fn test_clone_with_submodule() {
        let (source_dir, _source) = create_upstream();
        let (upstream_dir, upstream) = create_upstream();
        add_submodule(&upstream, source_dir.path());

        let (target, _repo) = clone_upstream(&upstream_dir);
        assert!(target.path().join("sub/README.md").exists());
    }

    #[test]
    fn test_failed_clone_empties_target() {
        let (source_dir, _source) = create_upstream();
        let (upstream_dir, upstream) = create_upstream();
        add_submodule(&upstream, source_dir.path());

        let moved = source_dir.path().with_extension("moved");
        fs::rename(source_dir.path(), &moved).unwrap();

        let target = TempDir::new().unwrap();
        let result = Repository::clone_branch(&url_of(&upstream_dir), target.path(), "main", None);
        assert!(result.is_err());
        assert!(target.path().is_dir());
        assert_eq!(fs::read_dir(target.path()).unwrap().count(), 0);

        fs::rename(&moved, source_dir.path()).unwrap();
        let repo =
            Repository::clone_branch(&url_of(&upstream_dir), target.path(), "main", None).unwrap();
        assert!(repo.path().join("sub/README.md").exists());
    }

    #[test]
    fn test_path() {
        let (upstream_dir, _upstream) = create_upstream();
        let (target, repo) = clone_upstream(&upstream_dir);
        // Use canonicalize to resolve symlinks (macOS /var -> /private/var)
        let expected = target.path().canonicalize().unwrap();
        let actual = repo.path().canonicalize().unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_origin_url() {
        let (upstream_dir, _upstream) = create_upstream();
        let (_target, repo) = clone_upstream(&upstream_dir);
        assert_eq!(repo.origin_url().unwrap(), url_of(&upstream_dir));
    }

    #[test]
    fn test_origin_url_missing() {
        let (upstream_dir, _upstream) = create_upstream();
        let repo = Repository::open(upstream_dir.path()).unwrap();
        assert!(matches!(repo.origin_url(), Err(GitError::NoOrigin(_))));
    }

    #[test]
    fn test_pull_up_to_date() {
        let (upstream_dir, _upstream) = create_upstream();
        let (_target, repo) = clone_upstream(&upstream_dir);
        let before = repo.head_commit().unwrap();

        repo.pull("main", None).unwrap();
        assert_eq!(repo.head_commit().unwrap(), before);
    }

    #[test]
    fn test_pull_fast_forward() {
        let (upstream_dir, upstream) = create_upstream();
        let (target, repo) = clone_upstream(&upstream_dir);

        let new_head = commit_file(&upstream, "page.html", "<p>new</p>\n", "Add page");
        repo.pull("main", None).unwrap();

        assert_eq!(repo.head_commit().unwrap(), new_head.to_string());
        assert!(target.path().join("page.html").exists());
    }

    #[test]
    fn test_pull_merges_diverged_history() {
        let (upstream_dir, upstream) = create_upstream();
        let (_target, repo) = clone_upstream(&upstream_dir);

        let local_head = commit_file(&repo.inner, "local.txt", "local\n", "Local change");
        let remote_head = commit_file(&upstream, "remote.txt", "remote\n", "Remote change");

        repo.pull("main", None).unwrap();

        let head = repo.inner.head().unwrap().peel_to_commit().unwrap();
        let parents: Vec<Oid> = head.parent_ids().collect();
        assert_eq!(parents, vec![local_head, remote_head]);
        assert!(repo.path().join("local.txt").exists());
        assert!(repo.path().join("remote.txt").exists());
    }

    #[test]
    fn test_pull_conflict() {
        let (upstream_dir, upstream) = create_upstream();
        let (_target, repo) = clone_upstream(&upstream_dir);

        commit_file(&repo.inner, "README.md", "local\n", "Local edit");
        commit_file(&upstream, "README.md", "remote\n", "Remote edit");

        let result = repo.pull("main", None);
        assert!(matches!(result, Err(GitError::MergeConflict(b)) if b == "main"));
    }

    #[test]
    fn test_pull_missing_branch() {
        let (upstream_dir, _upstream) = create_upstream();
        let (_target, repo) = clone_upstream(&upstream_dir);

        let result = repo.pull("gh-pages", None);
        assert!(result.is_err());
    }

    #[test]
    fn test_checkout_commit() {
        let (upstream_dir, upstream) = create_upstream();
        let first = upstream.head().unwrap().target().unwrap();
        commit_file(&upstream, "page.html", "<p>new</p>\n", "Add page");

        let (target, repo) = clone_upstream(&upstream_dir);
        assert!(target.path().join("page.html").exists());

        repo.checkout_commit(&first.to_string()).unwrap();
        assert_eq!(repo.head_commit().unwrap(), first.to_string());
        assert!(repo.inner.head_detached().unwrap());
        assert!(!target.path().join("page.html").exists());
    }

    #[test]
    fn test_checkout_short_hash() {
        let (upstream_dir, upstream) = create_upstream();
        let first = upstream.head().unwrap().target().unwrap().to_string();
        commit_file(&upstream, "page.html", "<p>new</p>\n", "Add page");

        let (_target, repo) = clone_upstream(&upstream_dir);
        repo.checkout_commit(&first[..10]).unwrap();
        assert_eq!(repo.head_commit().unwrap(), first);
    }

    #[test]
    fn test_checkout_invalid_commit() {
        let (upstream_dir, _upstream) = create_upstream();
        let (_target, repo) = clone_upstream(&upstream_dir);

        let result = repo.checkout_commit("0123456789abcdef0123456789abcdef01234567");
        assert!(matches!(result, Err(GitError::InvalidCommit(_))));
    }

    #[test]
    fn test_pull_after_checkout_reattaches_branch() {
        let (upstream_dir, upstream) = create_upstream();
        let first = upstream.head().unwrap().target().unwrap();
        let (_target, repo) = clone_upstream(&upstream_dir);

        repo.checkout_commit(&first.to_string()).unwrap();
        let new_head = commit_file(&upstream, "page.html", "<p>new</p>\n", "Add page");
        repo.pull("main", None).unwrap();

        assert_eq!(repo.head_commit().unwrap(), new_head.to_string());
        assert!(!repo.inner.head_detached().unwrap());
    }
}
