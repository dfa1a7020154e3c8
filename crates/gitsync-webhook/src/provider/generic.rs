//! Deliveries from any sender that can post JSON.

use serde::Deserialize;

use super::signature::verify_prefixed;
use super::{HookEvent, HookProvider, HookRequest, optional_header, push_of_ref, require_post};
use crate::{HookError, HookResult};

const SIGNATURE_HEADER: &str = "X-Hub-Signature-256";

/// A minimal protocol for custom senders.
///
/// The body is either empty, meaning "pull the tracked branch", or a JSON
/// object naming the branch through `ref` (`refs/heads/<branch>`) or
/// `branch`. With a secret, the body must be signed like a GitHub delivery.
#[derive(Debug, Clone, Copy, Default)]
pub struct Generic;

#[derive(Debug, Default, Deserialize)]
struct GenericPayload {
    #[serde(rename = "ref")]
    git_ref: Option<String>,
    branch: Option<String>,
}

impl HookProvider for Generic {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn inspect(&self, request: &HookRequest<'_>, secret: Option<&str>) -> HookResult<HookEvent> {
        require_post(request)?;

        if let Some(secret) = secret {
            let signature =
                optional_header(request, SIGNATURE_HEADER).ok_or(HookError::InvalidSignature)?;
            verify_prefixed(secret, request.body, signature)?;
        }

        if request.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(HookEvent::Push { branches: Vec::new() });
        }

        let payload: GenericPayload = serde_json::from_slice(request.body)?;
        Ok(match (payload.git_ref, payload.branch) {
            (Some(git_ref), _) => push_of_ref(&git_ref),
            (None, branch) => HookEvent::Push {
                branches: branch.into_iter().collect(),
            },
        })
    }
}
