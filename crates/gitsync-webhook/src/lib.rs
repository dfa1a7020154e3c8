//! Webhook endpoint for gitsync.
//!
//! Hosting providers notify gitsync of pushes by posting to a repository's
//! hook URL. The [`WebhookDispatcher`] checks each delivery with the
//! repository's [`HookProvider`] and pulls when the tracked branch moved.

mod dispatcher;
mod error;
mod provider;
mod router;

pub use dispatcher::{MAX_BODY_BYTES, WebhookDispatcher};
pub use error::{HookError, HookResult};
pub use provider::{
    Bitbucket, Generic, GitHub, GitLab, Gitee, Gogs, HookEvent, HookProvider, HookRequest,
    provider,
};
pub use router::build_router;
