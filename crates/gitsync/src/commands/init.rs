//! Initialize command.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Args;
use gitsync_config::CONFIG_FILE_NAME;

/// Arguments for the init command.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Force overwrite existing configuration
    #[arg(short, long)]
    pub force: bool,

    /// Repository to synchronize
    #[arg(long, default_value = "github.com/user/site")]
    pub url: String,
}

/// Runs the init command.
pub fn run(args: InitArgs, config: Option<&Path>) -> Result<()> {
    let path = config.map_or_else(|| PathBuf::from(CONFIG_FILE_NAME), Path::to_path_buf);

    if path.exists() && !args.force {
        bail!(
            "{} already exists, use --force to overwrite",
            path.display()
        );
    }

    fs::write(&path, starter_config(&args.url))
        .with_context(|| format!("failed to write {}", path.display()))?;

    println!("Created {}", path.display());
    Ok(())
}

fn starter_config(url: &str) -> String {
    format!(
        r#"# gitsync configuration

# Relative repository paths are resolved against this directory.
root = "."

[server]
listen = "127.0.0.1:8080"

[[repo]]
url = "{url}"
path = "site"
branch = "master"
interval = 3600

# Run after every update, in order.
# [[repo.then]]
# command = "hugo"
# args = ["--minify"]

# Pull on push instead of polling.
# [repo.hook]
# url = "/_hooks/site"
# secret = "change-me"
# type = "github"
"#
    )
}
