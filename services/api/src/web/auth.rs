//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for local API users: registration and login.
//! Login issues an opaque bearer token held server-side with an expiry.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::{error_response, state::AppState};

/// Days a local bearer token stays valid.
const TOKEN_VALIDITY_DAYS: i64 = 30;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct RegisterResponse {
    pub id: i64,
    pub username: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /register - Create a new local API user
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "User created successfully", body = RegisterResponse),
        (status = 400, description = "Invalid request or username taken"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // 1. Hash the password
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to hash password".to_string(),
            )
        })?
        .to_string();

    // 2. Create user in the store
    let user = state
        .store
        .create_user(&req.username, &password_hash)
        .await
        .map_err(|e| error_response("register", e))?;

    Ok(Json(RegisterResponse {
        id: user.id,
        username: user.username,
    }))
}

/// POST /auth/login - Login and receive a bearer token
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "User not found"),
        (status = 403, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // 1. Get user by username
    let user_creds = state
        .store
        .get_user_by_username(&req.username)
        .await
        .map_err(|_| (StatusCode::BAD_REQUEST, "User not found".to_string()))?;

    // 2. Verify password
    let parsed_hash = PasswordHash::new(&user_creds.password_hash).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Authentication error".to_string(),
        )
    })?;

    let valid = Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .is_ok();

    if !valid {
        return Err((StatusCode::FORBIDDEN, "Invalid credentials".to_string()));
    }

    // 3. Issue an opaque bearer token with an expiry
    let token = Uuid::new_v4().to_string();
    let expires_at = Utc::now() + Duration::days(TOKEN_VALIDITY_DAYS);

    state
        .store
        .create_auth_token(&token, user_creds.id, expires_at)
        .await
        .map_err(|e| error_response("login", e))?;

    Ok(Json(LoginResponse {
        success: true,
        token,
    }))
}
