//! Configuration management for gitsync.
//!
//! This crate handles loading and validating the `gitsync.toml` configuration file,
//! which declares the repositories to keep in sync.

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{CONFIG_FILE_NAME, find_and_load_config, find_and_load_config_from, load_config};
pub use schema::{
    Config, DEFAULT_BRANCH, DEFAULT_HOOK_TYPE, DEFAULT_INTERVAL_SECS, HookConfig, RepoConfig,
    ServerConfig, ThenConfig,
};
