//! HTTP router serving the webhook endpoints.

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::WebhookDispatcher;

/// Builds the router: `GET /health`, the dispatcher's hook paths, and 404
/// for everything else.
pub fn build_router(dispatcher: WebhookDispatcher) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .fallback(not_found);

    dispatcher
        .layer(router)
        .layer(TraceLayer::new_for_http())
}

async fn health() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}
