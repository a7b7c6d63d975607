//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::error;

use crate::web::state::AppState;

/// Middleware that validates the bearer token and extracts the user id.
///
/// A missing or malformed `Authorization` header is 401 Unauthorized; a
/// token the store does not recognise (or that has expired) is 403
/// Forbidden. On success the user id lands in the request extensions.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // 1. Extract the bearer token
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // 2. Resolve it to a user id
    let user_id = state.store.validate_auth_token(token).await.map_err(|e| {
        error!("Failed to validate bearer token: {:?}", e);
        StatusCode::FORBIDDEN
    })?;

    // 3. Insert the user id into request extensions
    req.extensions_mut().insert(user_id);

    // 4. Continue to the handler
    Ok(next.run(req).await)
}
