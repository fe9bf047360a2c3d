/**
 * Admin Routes
 * Comment moderation and contact inbox. Every handler requires `AdminUser`.
 */
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::auth::AdminUser;
use crate::db::models::{Author, CommentFilter, CommentWithContext, Contact, ContactStatus, PostSummary};
use crate::error::ApiError;
use crate::routes::{parse_id, JsonBody, MessageResponse};
use crate::state::AppState;

const COMMENT_NOT_FOUND: &str = "Comment not found";
const CONTACT_NOT_FOUND: &str = "Contact not found";

// ============================================================================
// Comments
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct CommentQuery {
    pub status: Option<String>,
}

impl CommentQuery {
    /// Unknown or missing values list everything.
    pub fn filter(&self) -> CommentFilter {
        match self.status.as_deref() {
            Some("pending") => CommentFilter::Pending,
            Some("approved") => CommentFilter::Approved,
            _ => CommentFilter::All,
        }
    }
}

/// Comment as shown in the moderation queue, with author email and post.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationComment {
    pub id: Uuid,
    pub content: String,
    pub approved: bool,
    pub author_id: Uuid,
    pub post_id: Uuid,
    pub author: Author,
    pub blog_post: PostSummary,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CommentWithContext> for ModerationComment {
    fn from(row: CommentWithContext) -> Self {
        let comment = row.comment;
        Self {
            id: comment.id,
            content: comment.content,
            approved: comment.approved,
            author_id: comment.author_id,
            post_id: comment.post_id,
            author: row.author,
            blog_post: row.post,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ModerationList {
    pub success: bool,
    pub comments: Vec<ModerationComment>,
}

#[derive(Debug, Serialize)]
pub struct ModerationResult {
    pub success: bool,
    pub comment: ModerationComment,
    pub message: String,
}

/// GET /api/admin/comments?status=pending|approved|all
pub async fn list_comments(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<CommentQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let comments = state
        .store
        .list_comments(query.filter())
        .await
        .map_err(|e| ApiError::internal("Failed to fetch comments", e))?;

    Ok(Json(ModerationList {
        success: true,
        comments: comments.into_iter().map(ModerationComment::from).collect(),
    }))
}

/// PATCH /api/admin/comments/{id} with `{ "approved": bool }`
pub async fn moderate_comment(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(approved) = body.get("approved").and_then(Value::as_bool) else {
        return Err(ApiError::bad_request("Approved status must be a boolean"));
    };
    let id = parse_id(&id, COMMENT_NOT_FOUND)?;

    let comment = state
        .store
        .set_comment_approval(id, approved)
        .await
        .map_err(|e| ApiError::internal("Failed to update comment", e))?
        .ok_or_else(|| ApiError::not_found(COMMENT_NOT_FOUND))?;

    tracing::info!(comment_id = %id, approved, moderator = %admin.id, "Comment moderated");
    let message = if approved {
        "Comment approved"
    } else {
        "Comment rejected"
    };
    Ok(Json(ModerationResult {
        success: true,
        comment: comment.into(),
        message: message.to_string(),
    }))
}

/// DELETE /api/admin/comments/{id}
pub async fn delete_comment(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, COMMENT_NOT_FOUND)?;
    let deleted = state
        .store
        .delete_comment(id)
        .await
        .map_err(|e| ApiError::internal("Failed to delete comment", e))?;

    if !deleted {
        return Err(ApiError::not_found(COMMENT_NOT_FOUND));
    }
    Ok(MessageResponse::ok("Comment deleted successfully"))
}

// ============================================================================
// Contacts
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ContactList {
    pub success: bool,
    pub contacts: Vec<Contact>,
}

#[derive(Debug, Serialize)]
pub struct ContactUpdated {
    pub success: bool,
    pub contact: Contact,
}

/// GET /api/admin/contacts
pub async fn list_contacts(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<impl IntoResponse, ApiError> {
    let contacts = state
        .store
        .list_contacts()
        .await
        .map_err(|e| ApiError::internal("Failed to fetch contacts", e))?;

    Ok(Json(ContactList {
        success: true,
        contacts,
    }))
}

/// PATCH /api/admin/contacts/{id} with `{ "status": "UNREAD" | "READ" | "REPLIED" }`
pub async fn update_contact_status(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let status = body
        .get("status")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<ContactStatus>().ok())
        .ok_or_else(|| ApiError::bad_request("Invalid status"))?;
    let id = parse_id(&id, CONTACT_NOT_FOUND)?;

    let contact = state
        .store
        .set_contact_status(id, status)
        .await
        .map_err(|e| ApiError::internal("Failed to update contact", e))?
        .ok_or_else(|| ApiError::not_found(CONTACT_NOT_FOUND))?;

    tracing::info!(contact_id = %id, status = status.as_str(), "Contact status updated");
    Ok(Json(ContactUpdated {
        success: true,
        contact,
    }))
}

/// DELETE /api/admin/contacts/{id}
pub async fn delete_contact(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, CONTACT_NOT_FOUND)?;
    let deleted = state
        .store
        .delete_contact(id)
        .await
        .map_err(|e| ApiError::internal("Failed to delete contact", e))?;

    if !deleted {
        return Err(ApiError::not_found(CONTACT_NOT_FOUND));
    }
    Ok(MessageResponse::ok("Contact deleted successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_query_filter() {
        let query = |s: &str| CommentQuery {
            status: Some(s.to_string()),
        };
        assert_eq!(query("pending").filter(), CommentFilter::Pending);
        assert_eq!(query("approved").filter(), CommentFilter::Approved);
        assert_eq!(query("all").filter(), CommentFilter::All);
        assert_eq!(query("bogus").filter(), CommentFilter::All);
        assert_eq!(CommentQuery::default().filter(), CommentFilter::All);
    }
}
