//! Check command.

use std::path::Path;

use anyhow::{Result, bail};

/// Runs the check command.
///
/// Every repository is checked even when an earlier one fails.
pub fn run(config: Option<&Path>) -> Result<()> {
    let config = super::load(config)?;
    let repos = super::repos(&config)?;

    let mut failed = 0;
    for repo in &repos {
        match repo.prepare() {
            Ok(()) => println!("ok      {} -> {}", repo.url(), repo.path().display()),
            Err(err) => {
                failed += 1;
                println!("error   {} -> {}: {err}", repo.url(), repo.path().display());
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} repositories failed validation", repos.len());
    }
    Ok(())
}
