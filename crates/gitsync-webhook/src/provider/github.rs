//! GitHub deliveries.

use std::borrow::Cow;

use axum::http::header::CONTENT_TYPE;
use url::form_urlencoded;

use super::signature::verify_prefixed;
use super::{
    HookEvent, HookProvider, HookRequest, header, optional_header, push_of_body, require_post,
};
use crate::{HookError, HookResult};

const EVENT_HEADER: &str = "X-GitHub-Event";
const SIGNATURE_256_HEADER: &str = "X-Hub-Signature-256";
const SIGNATURE_HEADER: &str = "X-Hub-Signature";

/// GitHub and GitHub Enterprise.
///
/// Signed deliveries carry `X-Hub-Signature-256`; older installations only
/// send the SHA-1 `X-Hub-Signature`. Hooks created with the form content
/// type wrap the JSON in a `payload` field.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitHub;

impl HookProvider for GitHub {
    fn name(&self) -> &'static str {
        "github"
    }

    fn inspect(&self, request: &HookRequest<'_>, secret: Option<&str>) -> HookResult<HookEvent> {
        require_post(request)?;

        if let Some(secret) = secret {
            let signature = optional_header(request, SIGNATURE_256_HEADER)
                .or_else(|| optional_header(request, SIGNATURE_HEADER))
                .ok_or(HookError::InvalidSignature)?;
            verify_prefixed(secret, request.body, signature)?;
        }

        match header(request, EVENT_HEADER)? {
            "ping" => Ok(HookEvent::Ping),
            "push" => push_of_body(&json_body(request)?),
            other => Err(HookError::UnsupportedEvent(other.to_string())),
        }
    }
}

fn json_body<'a>(request: &HookRequest<'a>) -> HookResult<Cow<'a, [u8]>> {
    let is_form = optional_header(request, CONTENT_TYPE.as_str())
        .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"));
    if !is_form {
        return Ok(Cow::Borrowed(request.body));
    }

    form_urlencoded::parse(request.body)
        .find(|(key, _)| key == "payload")
        .map(|(_, payload)| Cow::Owned(payload.into_owned().into_bytes()))
        .ok_or_else(|| HookError::MalformedPayload("form body has no payload field".to_string()))
}
