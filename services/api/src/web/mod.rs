pub mod auth;
pub mod middleware;
pub mod records;
pub mod rest;
pub mod state;

pub use middleware::require_auth;
pub use rest::ApiDoc;

use axum::http::StatusCode;
use checker_core::ports::PortError;
use tracing::error;

/// Maps a port error to a caller-visible status and message.
///
/// Validation and not-found messages are safe to show; everything else is
/// logged with its detail and reported generically so internals do not leak.
pub(crate) fn error_response(context: &str, err: PortError) -> (StatusCode, String) {
    match err {
        PortError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
        PortError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        PortError::Authentication(msg) => {
            error!("{context}: upstream authentication failed: {msg}");
            (
                StatusCode::UNAUTHORIZED,
                "Upstream authentication failed".to_string(),
            )
        }
        PortError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
        PortError::Gateway { status, body } => {
            error!("{context}: upstream request failed (status {status}): {body}");
            (
                StatusCode::BAD_GATEWAY,
                "Upstream request failed".to_string(),
            )
        }
        PortError::Unexpected(msg) => {
            error!("{context}: {msg}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    }
}
