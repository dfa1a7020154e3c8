//! Subcommand implementations.

pub mod check;
pub mod checkout;
pub mod init;
pub mod run;
pub mod sync;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use gitsync_config::{Config, find_and_load_config, load_config};
use gitsync_core::Repo;
use gitsync_git::{Git2Backend, GitBackend};
use tracing::debug;

/// Loads the configuration from `path`, or searches for it from the current
/// directory upwards.
fn load(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            load_config(path).with_context(|| format!("failed to load {}", path.display()))
        }
        None => find_and_load_config().context("failed to load configuration"),
    }
}

/// Builds every configured repository around a shared git backend.
fn repos(config: &Config) -> Result<Vec<Arc<Repo>>> {
    let backend: Arc<dyn GitBackend> =
        Arc::new(Git2Backend::init().context("git backend unavailable")?);

    let repos = config
        .repos
        .iter()
        .map(|repo| {
            Repo::from_config(config, repo, Arc::clone(&backend))
                .map(Arc::new)
                .with_context(|| format!("invalid repo {}", repo.url))
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(count = repos.len(), "repositories configured");
    Ok(repos)
}

/// Finds a repository by the final component of its clone path.
fn select<'a>(repos: &'a [Arc<Repo>], name: &str) -> Result<&'a Arc<Repo>> {
    match repos.iter().find(|repo| repo.name() == name) {
        Some(repo) => Ok(repo),
        None => {
            let known: Vec<String> = repos.iter().map(|repo| repo.name()).collect();
            bail!(
                "no repository named '{name}' (configured: {})",
                known.join(", ")
            )
        }
    }
}
