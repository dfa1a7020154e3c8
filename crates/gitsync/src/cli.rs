//! CLI definition.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

/// Keep working directories in sync with remote git repositories.
#[derive(Debug, Parser)]
#[command(name = "gitsync")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (default: gitsync.toml in this or a parent directory)
    #[arg(short, long, global = true, env = "GITSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Write a starter configuration file
    Init(commands::init::InitArgs),

    /// Validate the configuration and every clone directory
    Check,

    /// Pull every repository once and exit
    Sync(commands::sync::SyncArgs),

    /// Keep pulling on schedule and serve webhooks until interrupted
    Run,

    /// Check out a specific commit in a repository
    Checkout(commands::checkout::CheckoutArgs),
}

impl Cli {
    /// Runs the CLI command.
    pub fn run(self) -> Result<()> {
        let config = self.config.as_deref();
        match self.command {
            Commands::Init(args) => commands::init::run(args, config),
            Commands::Check => commands::check::run(config),
            Commands::Sync(args) => commands::sync::run(args, config),
            Commands::Run => commands::run::run(config),
            Commands::Checkout(args) => commands::checkout::run(args, config),
        }
    }
}
