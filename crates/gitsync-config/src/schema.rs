//! Configuration schema.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{ConfigError, ConfigResult};

/// Branch tracked when a repository does not name one.
pub const DEFAULT_BRANCH: &str = "master";

/// Polling interval used when none, zero or a negative one is configured.
pub const DEFAULT_INTERVAL_SECS: u64 = 3600;

/// Webhook provider assumed when a hook does not name one.
pub const DEFAULT_HOOK_TYPE: &str = "github";

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base directory for relative repository paths.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Webhook listener configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Repository declarations, in file order.
    #[serde(default, rename = "repo")]
    pub repos: Vec<RepoConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: default_root(),
            server: ServerConfig::default(),
            repos: Vec::new(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

impl Config {
    /// Resolves where a repository is checked out.
    ///
    /// Absolute paths are used as-is, relative ones are joined onto `root`,
    /// and a repository without a path is checked out into `root` itself.
    #[must_use]
    pub fn clone_path(&self, repo: &RepoConfig) -> PathBuf {
        match &repo.path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => self.root.join(path),
            None => self.root.clone(),
        }
    }

    /// Makes a relative `root` relative to `base` instead of the process
    /// working directory.
    pub fn resolve_root(&mut self, base: &Path) {
        if self.root.is_relative() {
            self.root = base.join(&self.root);
        }
    }

    /// Checks the declarations for values that cannot work.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first offending entry.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.repos.is_empty() {
            return Err(ConfigError::Invalid("no repositories declared".to_string()));
        }

        let mut hook_urls = HashSet::new();
        for (i, repo) in self.repos.iter().enumerate() {
            let invalid = |reason: &str| ConfigError::InvalidRepo {
                index: i + 1,
                reason: reason.to_string(),
            };

            if repo.url.trim().is_empty() {
                return Err(invalid("url is required"));
            }
            if repo.branch.trim().is_empty() {
                return Err(invalid("branch must not be empty"));
            }
            if repo.then.iter().any(|t| t.command.trim().is_empty()) {
                return Err(invalid("then entries need a command"));
            }
            if let Some(hook) = &repo.hook {
                if !hook.url.starts_with('/') {
                    return Err(invalid("hook url must be a path starting with '/'"));
                }
                if !hook_urls.insert(hook.url.as_str()) {
                    return Err(invalid(&format!("hook url {} is already in use", hook.url)));
                }
            }
        }
        Ok(())
    }
}

/// Webhook listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the webhook listener binds to.
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

/// A repository to keep in sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoConfig {
    /// Remote URL. A bare `host/path` means HTTPS.
    pub url: String,

    /// Checkout directory, relative to `root` unless absolute.
    pub path: Option<PathBuf>,

    /// Branch to track.
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Token sent as a basic-auth password.
    pub auth_token: Option<String>,

    /// Seconds between polls.
    pub interval: Option<i64>,

    /// Commands to run after the checkout moved to a new commit.
    #[serde(default)]
    pub then: Vec<ThenConfig>,

    /// Webhook trigger; when set, the repository is not polled.
    pub hook: Option<HookConfig>,
}

fn default_branch() -> String {
    DEFAULT_BRANCH.to_string()
}

impl RepoConfig {
    /// Creates a declaration for `url` with every other field defaulted.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            path: None,
            branch: default_branch(),
            auth_token: None,
            interval: None,
            then: Vec::new(),
            hook: None,
        }
    }

    /// Returns the polling interval in seconds.
    ///
    /// Zero and negative values are ignored in favor of the default.
    #[must_use]
    pub fn interval_secs(&self) -> u64 {
        match self.interval {
            Some(secs) if secs > 0 => secs.unsigned_abs(),
            _ => DEFAULT_INTERVAL_SECS,
        }
    }
}

/// A post-update command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThenConfig {
    /// Program to run.
    pub command: String,

    /// Arguments, passed verbatim.
    #[serde(default)]
    pub args: Vec<String>,

    /// Start the command without waiting for it to exit.
    #[serde(default)]
    pub long: bool,
}

/// Webhook trigger configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookConfig {
    /// Request path that routes to this repository.
    pub url: String,

    /// Shared secret used to validate deliveries.
    pub secret: Option<String>,

    /// Provider sending the deliveries.
    #[serde(default = "default_hook_type", rename = "type")]
    pub hook_type: String,
}

fn default_hook_type() -> String {
    DEFAULT_HOOK_TYPE.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> Config {
        toml::from_str(toml).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.root, PathBuf::from("."));
        assert_eq!(config.server.listen, "127.0.0.1:8080".parse().unwrap());
        assert!(config.repos.is_empty());
    }

    #[test]
    fn test_repo_defaults() {
        let repo = RepoConfig::new("github.com/user/site");
        assert_eq!(repo.branch, "master");
        assert_eq!(repo.interval_secs(), 3600);
        assert!(repo.auth_token.is_none());
        assert!(repo.then.is_empty());
        assert!(repo.hook.is_none());
    }

    #[test]
    fn test_interval_ignores_non_positive() {
        let mut repo = RepoConfig::new("github.com/user/site");
        repo.interval = Some(0);
        assert_eq!(repo.interval_secs(), DEFAULT_INTERVAL_SECS);
        repo.interval = Some(-30);
        assert_eq!(repo.interval_secs(), DEFAULT_INTERVAL_SECS);
        repo.interval = Some(90);
        assert_eq!(repo.interval_secs(), 90);
    }

    #[test]
    fn test_deserialize_empty() {
        let config = parse("");
        assert!(config.repos.is_empty());
        assert_eq!(config.root, PathBuf::from("."));
    }

    #[test]
    fn test_deserialize_minimal() {
        let config = parse(
            r#"
            [[repo]]
            url = "github.com/user/site"
        "#,
        );
        assert_eq!(config.repos.len(), 1);
        assert_eq!(config.repos[0].branch, "master");
        assert!(config.repos[0].path.is_none());
    }

    #[test]
    fn test_deserialize_full() {
        let config = parse(
            r#"
            root = "/srv"

            [server]
            listen = "0.0.0.0:9000"

            [[repo]]
            url = "https://github.com/user/site.git"
            path = "site"
            branch = "main"
            auth_token = "s3cret"
            interval = 60

            [[repo.then]]
            command = "hugo"
            args = ["--minify"]

            [[repo.then]]
            command = "systemctl"
            args = ["reload", "nginx"]
            long = true

            [repo.hook]
            url = "/_hooks/site"
            secret = "hush"
            type = "gitlab"

            [[repo]]
            url = "ssh://git@example.com:ops/config"
            path = "/etc/app"
        "#,
        );

        assert_eq!(config.root, PathBuf::from("/srv"));
        assert_eq!(config.server.listen.port(), 9000);
        assert_eq!(config.repos.len(), 2);

        let site = &config.repos[0];
        assert_eq!(site.branch, "main");
        assert_eq!(site.auth_token.as_deref(), Some("s3cret"));
        assert_eq!(site.interval_secs(), 60);
        assert_eq!(site.then.len(), 2);
        assert!(!site.then[0].long);
        assert!(site.then[1].long);
        assert_eq!(site.then[1].args, vec!["reload", "nginx"]);

        let hook = site.hook.as_ref().unwrap();
        assert_eq!(hook.url, "/_hooks/site");
        assert_eq!(hook.secret.as_deref(), Some("hush"));
        assert_eq!(hook.hook_type, "gitlab");

        assert!(config.repos[1].hook.is_none());
    }

    #[test]
    fn test_hook_type_defaults_to_github() {
        let config = parse(
            r#"
            [[repo]]
            url = "github.com/user/site"

            [repo.hook]
            url = "/deploy"
        "#,
        );
        let hook = config.repos[0].hook.as_ref().unwrap();
        assert_eq!(hook.hook_type, "github");
        assert!(hook.secret.is_none());
    }

    #[test]
    fn test_clone_path() {
        let config = Config {
            root: PathBuf::from("/srv"),
            ..Config::default()
        };

        let mut repo = RepoConfig::new("github.com/user/site");
        assert_eq!(config.clone_path(&repo), PathBuf::from("/srv"));

        repo.path = Some(PathBuf::from("www/site"));
        assert_eq!(config.clone_path(&repo), PathBuf::from("/srv/www/site"));

        repo.path = Some(PathBuf::from("/var/www"));
        assert_eq!(config.clone_path(&repo), PathBuf::from("/var/www"));
    }

    #[test]
    fn test_resolve_root() {
        let mut config = Config::default();
        config.resolve_root(Path::new("/etc/gitsync"));
        assert_eq!(config.root, PathBuf::from("/etc/gitsync/."));

        let mut absolute = Config {
            root: PathBuf::from("/srv"),
            ..Config::default()
        };
        absolute.resolve_root(Path::new("/etc/gitsync"));
        assert_eq!(absolute.root, PathBuf::from("/srv"));
    }

    #[test]
    fn test_validate_ok() {
        let config = Config {
            repos: vec![RepoConfig::new("github.com/user/site")],
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_no_repos() {
        let err = Config::default().validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_validate_empty_url() {
        let config = Config {
            repos: vec![RepoConfig::new("github.com/a/b"), RepoConfig::new("  ")],
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.to_string(), "invalid repo #2: url is required");
    }

    #[test]
    fn test_validate_hook_url_must_be_path() {
        let mut repo = RepoConfig::new("github.com/user/site");
        repo.hook = Some(HookConfig {
            url: "deploy".to_string(),
            secret: None,
            hook_type: default_hook_type(),
        });
        let config = Config {
            repos: vec![repo],
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRepo { index: 1, .. })
        ));
    }

    #[test]
    fn test_validate_duplicate_hook_url() {
        let hook = HookConfig {
            url: "/deploy".to_string(),
            secret: None,
            hook_type: default_hook_type(),
        };
        let mut first = RepoConfig::new("github.com/user/a");
        first.hook = Some(hook.clone());
        let mut second = RepoConfig::new("github.com/user/b");
        second.hook = Some(hook);

        let config = Config {
            repos: vec![first, second],
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"invalid repo #2: hook url /deploy is already in use");
    }

    #[test]
    fn test_validate_empty_command() {
        let mut repo = RepoConfig::new("github.com/user/site");
        repo.then.push(ThenConfig {
            command: String::new(),
            args: Vec::new(),
            long: false,
        });
        let config = Config {
            repos: vec![repo],
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_serialize_roundtrip_keeps_repo_table() {
        let config = Config {
            repos: vec![RepoConfig::new("github.com/user/site")],
            ..Config::default()
        };
        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("[[repo]]"));
        assert!(toml_str.contains("url = \"github.com/user/site\""));
    }
}
