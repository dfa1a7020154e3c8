//! Sync command.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Result, bail};
use clap::Args;
use gitsync_core::Repo;
use tracing::error;

/// Arguments for the sync command.
#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Only sync the repository whose clone directory has this name
    #[arg(short, long)]
    pub repo: Option<String>,
}

/// Runs the sync command.
pub fn run(args: SyncArgs, config: Option<&Path>) -> Result<()> {
    let config = super::load(config)?;
    let repos = super::repos(&config)?;

    let selected: Vec<Arc<Repo>> = match &args.repo {
        Some(name) => vec![Arc::clone(super::select(&repos, name)?)],
        None => repos,
    };

    let mut failed = 0;
    for repo in &selected {
        let result = repo.prepare().and_then(|()| repo.pull());
        match result {
            Ok(outcome) => println!("{}: {outcome}", repo.url()),
            Err(err) => {
                failed += 1;
                error!(url = %repo.url(), error = %err, "sync failed");
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} repositories failed to sync", selected.len());
    }
    Ok(())
}
