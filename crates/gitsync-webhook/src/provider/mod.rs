//! Hosting providers and how their deliveries are validated.

mod bitbucket;
mod generic;
mod github;
mod gitlab;
mod gogs;
mod signature;

use axum::http::{HeaderMap, Method};
use gitsync_core::HookType;
use serde::Deserialize;

use crate::{HookError, HookResult};

pub use bitbucket::Bitbucket;
pub use generic::Generic;
pub use github::GitHub;
pub use gitlab::{Gitee, GitLab};
pub use gogs::Gogs;

/// The parts of an HTTP request a provider looks at.
#[derive(Debug, Clone, Copy)]
pub struct HookRequest<'a> {
    /// Request method.
    pub method: &'a Method,
    /// Request headers.
    pub headers: &'a HeaderMap,
    /// Raw body, as signed by the sender.
    pub body: &'a [u8],
}

/// What a validated delivery asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookEvent {
    /// Connectivity check sent when the hook is created.
    Ping,
    /// New commits were pushed. An empty list means the tracked branch.
    Push {
        /// The branches that moved.
        branches: Vec<String>,
    },
    /// A valid delivery that does not concern branches.
    Ignored(String),
}

/// Validates deliveries from one hosting provider.
pub trait HookProvider: Send + Sync {
    /// Returns the provider's configuration name.
    fn name(&self) -> &'static str;

    /// Authenticates the delivery against `secret` and decodes its event.
    ///
    /// # Errors
    ///
    /// Returns a [`HookError`] if the method, headers, signature or payload
    /// are not what this provider sends.
    fn inspect(&self, request: &HookRequest<'_>, secret: Option<&str>) -> HookResult<HookEvent>;
}

/// Returns the provider implementing `hook_type`.
#[must_use]
pub fn provider(hook_type: HookType) -> &'static dyn HookProvider {
    match hook_type {
        HookType::Github => &GitHub,
        HookType::Gitlab => &GitLab,
        HookType::Gitee => &Gitee,
        HookType::Gogs => &Gogs,
        HookType::Bitbucket => &Bitbucket,
        HookType::Generic => &Generic,
    }
}

/// Body of a push event that names the ref that moved.
#[derive(Debug, Deserialize)]
struct RefPayload {
    #[serde(rename = "ref")]
    git_ref: String,
}

fn require_post(request: &HookRequest<'_>) -> HookResult<()> {
    if *request.method == Method::POST {
        Ok(())
    } else {
        Err(HookError::MethodNotAllowed(request.method.clone()))
    }
}

fn header<'a>(request: &HookRequest<'a>, name: &'static str) -> HookResult<&'a str> {
    optional_header(request, name).ok_or(HookError::MissingHeader(name))
}

fn optional_header<'a>(request: &HookRequest<'a>, name: &str) -> Option<&'a str> {
    request
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
}

/// Turns `refs/heads/<branch>` into a push of `<branch>`.
fn push_of_ref(git_ref: &str) -> HookEvent {
    match git_ref.strip_prefix("refs/heads/") {
        Some(branch) => HookEvent::Push {
            branches: vec![branch.to_string()],
        },
        None => HookEvent::Ignored(format!("ignoring push to {git_ref}")),
    }
}

fn push_of_body(body: &[u8]) -> HookResult<HookEvent> {
    let payload: RefPayload = serde_json::from_slice(body)?;
    Ok(push_of_ref(&payload.git_ref))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::http::HeaderValue;

    /// Owns what a [`HookRequest`] borrows.
    pub(crate) struct Delivery {
        pub(crate) method: Method,
        pub(crate) headers: HeaderMap,
        pub(crate) body: Vec<u8>,
    }

    impl Delivery {
        pub(crate) fn post(body: &str) -> Self {
            Self {
                method: Method::POST,
                headers: HeaderMap::new(),
                body: body.as_bytes().to_vec(),
            }
        }

        pub(crate) fn header(mut self, name: &'static str, value: &str) -> Self {
            self.headers
                .insert(name, HeaderValue::from_str(value).unwrap());
            self
        }

        pub(crate) fn method(mut self, method: Method) -> Self {
            self.method = method;
            self
        }

        pub(crate) fn request(&self) -> HookRequest<'_> {
            HookRequest {
                method: &self.method,
                headers: &self.headers,
                body: &self.body,
            }
        }
    }

    pub(crate) fn push(branch: &str) -> HookEvent {
        HookEvent::Push {
            branches: vec![branch.to_string()],
        }
    }

    #[test]
    fn test_provider_names_match_hook_types() {
        for hook_type in HookType::ALL {
            assert_eq!(provider(hook_type).name(), hook_type.name());
        }
    }

    #[test]
    fn test_push_of_ref() {
        assert_eq!(push_of_ref("refs/heads/main"), push("main"));
        assert_eq!(push_of_ref("refs/heads/feature/x"), push("feature/x"));
        assert!(matches!(push_of_ref("refs/tags/v1.0"), HookEvent::Ignored(_)));
    }

    #[test]
    fn test_push_of_body_rejects_missing_ref() {
        assert!(matches!(
            push_of_body(br#"{"after": "abc"}"#),
            Err(HookError::MalformedPayload(_))
        ));
    }
}
