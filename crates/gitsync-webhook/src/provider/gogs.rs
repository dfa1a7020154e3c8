//! Gogs and Gitea deliveries.

use super::signature::verify_sha256;
use super::{
    HookEvent, HookProvider, HookRequest, optional_header, push_of_body, require_post,
};
use crate::{HookError, HookResult};

const EVENT_HEADER: &str = "X-Gogs-Event";
const SIGNATURE_HEADER: &str = "X-Gogs-Signature";

/// Gogs. Gitea deliveries are accepted too, under its own header names.
#[derive(Debug, Clone, Copy, Default)]
pub struct Gogs;

impl HookProvider for Gogs {
    fn name(&self) -> &'static str {
        "gogs"
    }

    fn inspect(&self, request: &HookRequest<'_>, secret: Option<&str>) -> HookResult<HookEvent> {
        require_post(request)?;

        if let Some(secret) = secret {
            let signature = optional_header(request, SIGNATURE_HEADER)
                .or_else(|| optional_header(request, "X-Gitea-Signature"))
                .ok_or(HookError::InvalidSignature)?;
            verify_sha256(secret, request.body, signature)?;
        }

        let event = optional_header(request, EVENT_HEADER)
            .or_else(|| optional_header(request, "X-Gitea-Event"))
            .ok_or(HookError::MissingHeader(EVENT_HEADER))?;
        match event {
            "push" => push_of_body(request.body),
            other => Err(HookError::UnsupportedEvent(other.to_string())),
        }
    }
}
