//! Webhook settings attached to a repository.

use std::fmt;
use std::str::FromStr;

use crate::SyncError;

/// Hosting providers whose push webhooks are understood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookType {
    /// GitHub and GitHub Enterprise.
    Github,
    /// GitLab.
    Gitlab,
    /// Gitee.
    Gitee,
    /// Gogs and Gitea.
    Gogs,
    /// Bitbucket Cloud.
    Bitbucket,
    /// Any sender posting an optionally signed JSON body.
    Generic,
}

impl HookType {
    /// Every supported provider.
    pub const ALL: [Self; 6] = [
        Self::Github,
        Self::Gitlab,
        Self::Gitee,
        Self::Gogs,
        Self::Bitbucket,
        Self::Generic,
    ];

    /// Returns the name used in configuration files.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Github => "github",
            Self::Gitlab => "gitlab",
            Self::Gitee => "gitee",
            Self::Gogs => "gogs",
            Self::Bitbucket => "bitbucket",
            Self::Generic => "generic",
        }
    }
}

impl FromStr for HookType {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|hook_type| hook_type.name() == wanted)
            .ok_or_else(|| SyncError::Configuration(format!("invalid hook type {s}")))
    }
}

impl fmt::Display for HookType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a repository listens for webhook events and how they are checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookConfig {
    /// Request path that triggers this repository, such as `/_hooks/site`.
    pub url: String,
    /// Shared secret used to sign or authenticate deliveries.
    pub secret: Option<String>,
    /// Provider sending the deliveries.
    pub hook_type: HookType,
}

impl HookConfig {
    /// Creates a hook for `url` without a secret.
    #[must_use]
    pub fn new(url: impl Into<String>, hook_type: HookType) -> Self {
        Self {
            url: url.into(),
            secret: None,
            hook_type,
        }
    }

    /// Sets the shared secret.
    #[must_use]
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }
}
