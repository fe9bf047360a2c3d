use axum::http::{header, HeaderMap};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::models::{Role, User};
use crate::state::AppState;

/// Cookie carrying the session JWT.
pub const SESSION_COOKIE: &str = "auth-token";

/// Public identity of the caller. Never includes the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SessionUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<User> for SessionUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            display_name: user.display_name,
            role: user.role,
            avatar: user.avatar,
            created_at: user.created_at,
        }
    }
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
}

/// The session cookie wins over a bearer header.
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    cookie_value(headers, SESSION_COOKIE)
        .filter(|t| !t.is_empty())
        .or_else(|| bearer_token(headers).filter(|t| !t.is_empty()))
}

/// Resolve the caller from the request headers.
///
/// Missing or invalid tokens, and tokens whose user no longer exists, all
/// yield `None`. Store failures are logged and also yield `None`.
pub async fn resolve_session(state: &AppState, headers: &HeaderMap) -> Option<SessionUser> {
    let token = extract_token(headers)?;

    let claims = match state.tokens.verify(token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!("Token verification failed: {}", e);
            return None;
        }
    };

    match state.store.find_user_by_id(claims.id).await {
        Ok(Some(user)) => Some(user.into()),
        Ok(None) => {
            tracing::debug!(user_id = %claims.id, "token subject no longer exists");
            None
        }
        Err(e) => {
            tracing::error!("Database error resolving session: {}", e);
            None
        }
    }
}

/// `Set-Cookie` value carrying a fresh session token.
pub fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that expires the session cookie.
pub fn clear_session_cookie(secure: bool) -> String {
    session_cookie("", 0, secure)
}
