//! Checkout command.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

/// Arguments for the checkout command.
#[derive(Debug, Args)]
pub struct CheckoutArgs {
    /// Name of the repository's clone directory
    pub repo: String,

    /// Commit to check out
    pub commit: String,
}

/// Runs the checkout command.
pub fn run(args: CheckoutArgs, config: Option<&Path>) -> Result<()> {
    let config = super::load(config)?;
    let repos = super::repos(&config)?;
    let repo = super::select(&repos, &args.repo)?;

    repo.prepare()
        .with_context(|| format!("cannot use {}", repo.path().display()))?;
    repo.checkout_commit(&args.commit)
        .with_context(|| format!("failed to check out {}", args.commit))?;

    println!("{} is at {}", repo.path().display(), args.commit);
    Ok(())
}
