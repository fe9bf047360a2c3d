//! Role gate. Every protected handler goes through `require_role`, either
//! directly or through one of the extractors below, which run before the
//! request body is read.

use axum::{extract::FromRequestParts, http::request::Parts};
use std::convert::Infallible;

use super::{resolve_session, SessionUser};
use crate::db::models::Role;
use crate::error::ApiError;
use crate::state::AppState;

/// Result of checking a session against a set of allowed roles.
#[derive(Debug, Clone, PartialEq)]
pub enum Access {
    Authorized(SessionUser),
    Unauthenticated,
    Forbidden(SessionUser),
}

pub fn require_role(session: Option<SessionUser>, allowed: &[Role]) -> Access {
    match session {
        None => Access::Unauthenticated,
        Some(user) if allowed.contains(&user.role) => Access::Authorized(user),
        Some(user) => Access::Forbidden(user),
    }
}

impl Access {
    pub fn into_result(self) -> Result<SessionUser, ApiError> {
        match self {
            Access::Authorized(user) => Ok(user),
            Access::Unauthenticated => {
                Err(ApiError::Unauthorized("Authentication required".to_string()))
            }
            Access::Forbidden(user) => {
                tracing::warn!(user_id = %user.id, role = %user.role, "access denied");
                Err(ApiError::Forbidden("Admin access required".to_string()))
            }
        }
    }
}

/// The caller, if any. Never rejects.
pub struct MaybeUser(pub Option<SessionUser>);

/// Any signed-in user.
pub struct CurrentUser(pub SessionUser);

/// A signed-in user with the `ADMIN` role.
pub struct AdminUser(pub SessionUser);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(resolve_session(state, &parts.headers).await))
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = resolve_session(state, &parts.headers).await;
        require_role(session, &[Role::User, Role::Admin])
            .into_result()
            .map(CurrentUser)
    }
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = resolve_session(state, &parts.headers).await;
        require_role(session, &[Role::Admin])
            .into_result()
            .map(AdminUser)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use chrono::Utc;
    use uuid::Uuid;

    fn user(role: Role) -> SessionUser {
        SessionUser {
            id: Uuid::new_v4(),
            email: "someone@example.com".to_string(),
            display_name: "Someone".to_string(),
            role,
            avatar: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_no_session_is_unauthenticated() {
        assert_eq!(require_role(None, &[Role::Admin]), Access::Unauthenticated);
        let err = require_role(None, &[Role::Admin]).into_result().unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_wrong_role_is_forbidden() {
        let access = require_role(Some(user(Role::User)), &[Role::Admin]);
        assert!(matches!(access, Access::Forbidden(_)));
        assert_eq!(
            access.into_result().unwrap_err().status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_allowed_role_is_authorized() {
        let admin = user(Role::Admin);
        assert_eq!(
            require_role(Some(admin.clone()), &[Role::Admin]),
            Access::Authorized(admin)
        );
        assert!(matches!(
            require_role(Some(user(Role::User)), &[Role::User, Role::Admin]),
            Access::Authorized(_)
        ));
    }
}
