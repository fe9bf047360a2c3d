/**
 * Routes Module
 * API route handlers and the request helpers they share
 */
use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    Json,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{require_role, SessionUser};
use crate::db::models::{ListFilter, Role};
use crate::error::ApiError;

pub mod admin;
pub mod auth;
pub mod blog;
pub mod contact;
pub mod health;
pub mod projects;

/// `Json<T>` whose rejections use the shared error body.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    tracing::debug!("Rejected request body: {}", rejection.body_text());
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::PayloadTooLarge;
    }
    ApiError::bad_request(rejection.body_text())
}

/// Path ids that aren't UUIDs can't name a row, so they are plain 404s.
pub fn parse_id(raw: &str, not_found: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::not_found(not_found))
}

/// `{ success: true, message }` body for deletes and other acknowledgements.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
        })
    }
}

/// Query parameters shared by the project and blog listings
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub published: Option<String>,
    pub featured: Option<String>,
}

/// Public listings only show published rows. `published=false` widens the
/// listing to everything and needs an admin session.
pub fn list_filter(query: &ListQuery, session: Option<SessionUser>) -> Result<ListFilter, ApiError> {
    let published = match query.published.as_deref() {
        Some("false") => {
            require_role(session, &[Role::Admin]).into_result()?;
            None
        }
        _ => Some(true),
    };
    let featured = match query.featured.as_deref() {
        Some("true") => Some(true),
        _ => None,
    };
    Ok(ListFilter { published, featured })
}

/// Unpublished rows are invisible to everyone but admins.
pub fn visible_to(published: bool, session: Option<&SessionUser>) -> bool {
    published || session.is_some_and(SessionUser::is_admin)
}

/// Treat an empty string the same as an absent optional field.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
