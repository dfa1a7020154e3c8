//! Webhook error types.

use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Reasons a webhook delivery is rejected.
///
/// A rejected delivery never touches the repository.
#[derive(Debug, Error)]
pub enum HookError {
    /// The provider only sends POST requests.
    #[error("method {0} not allowed")]
    MethodNotAllowed(Method),

    /// A header the provider always sends is absent.
    #[error("missing required header: {0}")]
    MissingHeader(&'static str),

    /// The payload signature does not match the shared secret.
    #[error("invalid signature")]
    InvalidSignature,

    /// The token header does not match the shared secret.
    #[error("invalid token")]
    InvalidToken,

    /// The event kind cannot trigger a pull.
    #[error("unsupported event: {0}")]
    UnsupportedEvent(String),

    /// The body could not be read or decoded.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

impl HookError {
    /// Returns the HTTP status sent back to the provider.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::InvalidSignature | Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::MissingHeader(_) | Self::UnsupportedEvent(_) | Self::MalformedPayload(_) => {
                StatusCode::BAD_REQUEST
            }
        }
    }
}

impl From<serde_json::Error> for HookError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedPayload(err.to_string())
    }
}

impl IntoResponse for HookError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

/// Result type for webhook validation.
pub type HookResult<T> = Result<T, HookError>;
