//! Routes webhook deliveries to the repository they trigger.

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use gitsync_core::{Repo, pull_blocking};
use tracing::{debug, error, info, warn};

use crate::HookError;
use crate::provider::{HookEvent, HookRequest, provider};

/// Largest delivery body accepted, in bytes.
pub const MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

/// Middleware answering deliveries for webhook-driven repositories.
///
/// A request whose path matches a repository's hook URL is validated by that
/// repository's provider and, for a push to the tracked branch, answered only
/// once the pull has finished. Every other request goes to the inner router.
#[derive(Debug, Clone, Default)]
pub struct WebhookDispatcher {
    repos: Vec<Arc<Repo>>,
}

impl WebhookDispatcher {
    /// Creates a dispatcher for the repositories that have a hook.
    #[must_use]
    pub fn new<I>(repos: I) -> Self
    where
        I: IntoIterator<Item = Arc<Repo>>,
    {
        Self {
            repos: repos
                .into_iter()
                .filter(|repo| repo.is_webhook_driven())
                .collect(),
        }
    }

    /// Returns the number of routed repositories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.repos.len()
    }

    /// Whether no repository has a hook.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.repos.is_empty()
    }

    /// Returns the repository whose hook URL is exactly `path`.
    #[must_use]
    pub fn route(&self, path: &str) -> Option<&Arc<Repo>> {
        self.repos
            .iter()
            .find(|repo| repo.hook().is_some_and(|hook| hook.url == path))
    }

    /// Wraps `router` so that hook paths are answered by this dispatcher.
    pub fn layer(self, router: Router) -> Router {
        router.layer(middleware::from_fn_with_state(Arc::new(self), dispatch))
    }

    async fn handle(&self, repo: Arc<Repo>, request: Request) -> Response {
        let Some(hook) = repo.hook() else {
            return StatusCode::NOT_FOUND.into_response();
        };

        let (parts, body) = request.into_parts();
        let body = match to_bytes(body, MAX_BODY_BYTES).await {
            Ok(body) => body,
            Err(err) => {
                return HookError::MalformedPayload(format!("cannot read body: {err}"))
                    .into_response();
            }
        };

        let delivery = HookRequest {
            method: &parts.method,
            headers: &parts.headers,
            body: &body,
        };
        let event = match provider(hook.hook_type).inspect(&delivery, hook.secret.as_deref()) {
            Ok(event) => event,
            Err(err) => {
                warn!(
                    path = %parts.uri.path(),
                    provider = %hook.hook_type,
                    error = %err,
                    "webhook rejected"
                );
                return err.into_response();
            }
        };

        match event {
            HookEvent::Ping => (StatusCode::OK, "pong").into_response(),
            HookEvent::Ignored(reason) => {
                debug!(url = %repo.url(), %reason, "webhook ignored");
                (StatusCode::OK, reason).into_response()
            }
            HookEvent::Push { branches }
                if !branches.is_empty() && !branches.iter().any(|b| b == repo.branch()) =>
            {
                let branches = branches.join(", ");
                info!(url = %repo.url(), %branches, "ignoring push to untracked branch");
                (
                    StatusCode::OK,
                    format!("ignoring push to branch {branches}"),
                )
                    .into_response()
            }
            HookEvent::Push { .. } => pull(repo).await,
        }
    }
}

async fn dispatch(
    State(dispatcher): State<Arc<WebhookDispatcher>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match dispatcher.route(request.uri().path()) {
        Some(repo) => dispatcher.handle(Arc::clone(repo), request).await,
        None => next.run(request).await,
    }
}

async fn pull(repo: Arc<Repo>) -> Response {
    let url = repo.url().to_string();
    match pull_blocking(repo).await {
        Ok(outcome) => (StatusCode::OK, outcome.to_string()).into_response(),
        Err(err) => {
            error!(%url, error = %err, "webhook pull failed");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
        }
    }
}
