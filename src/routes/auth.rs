/**
 * Authentication Routes
 * Cookie-based sessions: register, login, logout and the current user
 */
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::session::{clear_session_cookie, session_cookie};
use crate::auth::{MaybeUser, SessionUser};
use crate::db::models::{NewUser, Role};
use crate::db::StoreError;
use crate::error::ApiError;
use crate::routes::{JsonBody, MessageResponse};
use crate::state::AppState;

const MIN_PASSWORD_CHARS: usize = 6;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: SessionUser,
    pub token: String,
    pub message: String,
}

// ============================================================================
// Helpers
// ============================================================================

fn present(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Issue a token for `user` and answer with it in both the body and cookie.
fn session_response(
    state: &AppState,
    status: StatusCode,
    user: SessionUser,
    message: &str,
) -> Result<impl IntoResponse, ApiError> {
    let token = state
        .tokens
        .issue(&user)
        .map_err(|e| ApiError::internal("Internal server error", e))?;
    let cookie = session_cookie(
        &token,
        state.tokens.ttl_secs(),
        state.config.is_production(),
    );

    Ok((
        status,
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse {
            user,
            token,
            message: message.to_string(),
        }),
    ))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/auth/register
/// Self-service sign-up; always creates a `USER`.
pub async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(email), Some(password), Some(display_name)) = (
        present(payload.email),
        present(payload.password),
        present(payload.display_name),
    ) else {
        return Err(ApiError::bad_request(
            "Email, password, and display name are required",
        ));
    };
    let email = email.trim().to_string();

    if !email.validate_email() {
        return Err(ApiError::bad_request("Invalid email format"));
    }
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ApiError::bad_request(
            "Password must be at least 6 characters",
        ));
    }

    let existing = state
        .store
        .find_user_by_email(&email)
        .await
        .map_err(|e| ApiError::internal("Internal server error", e))?;
    if existing.is_some() {
        return Err(ApiError::Conflict("User already exists".to_string()));
    }

    let password_hash = hash_password(password, state.config.bcrypt_cost)
        .await
        .map_err(|e| ApiError::internal("Internal server error", e))?;

    let user = match state
        .store
        .insert_user(NewUser {
            email,
            password_hash,
            display_name: display_name.trim().to_string(),
            role: Role::User,
        })
        .await
    {
        Ok(user) => user,
        Err(StoreError::Conflict(_)) => {
            return Err(ApiError::Conflict("User already exists".to_string()))
        }
        Err(e) => return Err(ApiError::internal("Internal server error", e)),
    };

    tracing::info!(user_id = %user.id, "User registered");
    session_response(
        &state,
        StatusCode::CREATED,
        user.into(),
        "Registration successful",
    )
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(email), Some(password)) = (present(payload.email), present(payload.password)) else {
        return Err(ApiError::bad_request("Email and password are required"));
    };

    let user = state
        .store
        .find_user_by_email(email.trim())
        .await
        .map_err(|e| ApiError::internal("Internal server error", e))?;

    let Some(user) = user else {
        tracing::warn!("Login failed: unknown email");
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    };

    let valid = verify_password(password, user.password_hash.clone())
        .await
        .map_err(|e| ApiError::internal("Internal server error", e))?;
    if !valid {
        tracing::warn!(user_id = %user.id, "Login failed: wrong password");
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    tracing::info!(user_id = %user.id, "User logged in");
    session_response(&state, StatusCode::OK, user.into(), "Login successful")
}

/// POST /api/auth/logout
/// Expires the session cookie. Tokens are stateless, so nothing is revoked.
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(
            header::SET_COOKIE,
            clear_session_cookie(state.config.is_production()),
        )],
        MessageResponse::ok("Logged out successfully"),
    )
}

/// GET /api/auth/me
pub async fn me(MaybeUser(session): MaybeUser) -> Result<impl IntoResponse, ApiError> {
    session
        .map(Json)
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))
}
