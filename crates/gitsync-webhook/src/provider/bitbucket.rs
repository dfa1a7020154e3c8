//! Bitbucket Cloud deliveries.

use serde::Deserialize;

use super::signature::verify_prefixed;
use super::{HookEvent, HookProvider, HookRequest, header, optional_header, require_post};
use crate::{HookError, HookResult};

const EVENT_HEADER: &str = "X-Event-Key";
const SIGNATURE_HEADER: &str = "X-Hub-Signature";

/// Bitbucket Cloud.
///
/// A push lists one change per updated ref; every branch change is reported
/// so a push touching several branches still reaches the tracked one.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bitbucket;

#[derive(Debug, Deserialize)]
struct PushPayload {
    push: Push,
}

#[derive(Debug, Deserialize)]
struct Push {
    #[serde(default)]
    changes: Vec<Change>,
}

#[derive(Debug, Deserialize)]
struct Change {
    new: Option<RefState>,
}

#[derive(Debug, Deserialize)]
struct RefState {
    #[serde(rename = "type")]
    kind: String,
    name: String,
}

impl HookProvider for Bitbucket {
    fn name(&self) -> &'static str {
        "bitbucket"
    }

    fn inspect(&self, request: &HookRequest<'_>, secret: Option<&str>) -> HookResult<HookEvent> {
        require_post(request)?;

        if let Some(secret) = secret {
            let signature =
                optional_header(request, SIGNATURE_HEADER).ok_or(HookError::InvalidSignature)?;
            verify_prefixed(secret, request.body, signature)?;
        }

        match header(request, EVENT_HEADER)? {
            "repo:push" => {
                let payload: PushPayload = serde_json::from_slice(request.body)?;
                let branches: Vec<String> = payload
                    .push
                    .changes
                    .into_iter()
                    .filter_map(|change| change.new)
                    .filter(|new| new.kind == "branch")
                    .map(|new| new.name)
                    .collect();
                Ok(if branches.is_empty() {
                    HookEvent::Ignored("push has no branch changes".to_string())
                } else {
                    HookEvent::Push { branches }
                })
            }
            other => Err(HookError::UnsupportedEvent(other.to_string())),
        }
    }
}
