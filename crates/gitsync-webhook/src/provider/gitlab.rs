//! GitLab and Gitee deliveries.
//!
//! Both send the secret back verbatim in a token header instead of signing
//! the payload.

use super::signature::verify_token;
use super::{HookEvent, HookProvider, HookRequest, header, push_of_body, require_post};
use crate::{HookError, HookResult};

/// GitLab.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitLab;

/// Gitee.
#[derive(Debug, Clone, Copy, Default)]
pub struct Gitee;

impl HookProvider for GitLab {
    fn name(&self) -> &'static str {
        "gitlab"
    }

    fn inspect(&self, request: &HookRequest<'_>, secret: Option<&str>) -> HookResult<HookEvent> {
        inspect_token_push(request, secret, "X-Gitlab-Token", "X-Gitlab-Event")
    }
}

impl HookProvider for Gitee {
    fn name(&self) -> &'static str {
        "gitee"
    }

    fn inspect(&self, request: &HookRequest<'_>, secret: Option<&str>) -> HookResult<HookEvent> {
        inspect_token_push(request, secret, "X-Gitee-Token", "X-Gitee-Event")
    }
}

fn inspect_token_push(
    request: &HookRequest<'_>,
    secret: Option<&str>,
    token_header: &'static str,
    event_header: &'static str,
) -> HookResult<HookEvent> {
    require_post(request)?;

    if let Some(secret) = secret {
        let token = header(request, token_header).map_err(|_| HookError::InvalidToken)?;
        verify_token(secret, token)?;
    }

    match header(request, event_header)? {
        "Push Hook" => push_of_body(request.body),
        "Tag Push Hook" => Ok(HookEvent::Ignored("ignoring tag push".to_string())),
        other => Err(HookError::UnsupportedEvent(other.to_string())),
    }
}
