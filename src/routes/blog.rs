/**
 * Blog Routes
 * Posts (public read, admin write) and their comment threads
 */
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::auth::{AdminUser, CurrentUser, MaybeUser, SessionUser};
use crate::db::models::{
    Author, BlogPostInput, BlogPostWithAuthor, CommentFilter, CommentWithContext, NewComment,
};
use crate::db::StoreError;
use crate::error::ApiError;
use crate::list_field::{decode_list, decode_list_value, encode_list};
use crate::routes::{
    list_filter, non_empty, parse_id, visible_to, JsonBody, ListQuery, MessageResponse,
};
use crate::state::AppState;

const NOT_FOUND: &str = "Blog post not found";

/// Reading speed used for `readTime`.
const WORDS_PER_MINUTE: usize = 200;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Body for POST /api/blog and PUT /api/blog/{id}.
/// `tags` may be an array or a comma-separated string.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    #[serde(default)]
    pub tags: Value,
    pub image: Option<String>,
    pub published: Option<bool>,
    pub featured: Option<bool>,
}

impl BlogPostRequest {
    pub fn into_input(self) -> Result<BlogPostInput, ApiError> {
        let (Some(title), Some(content)) = (non_empty(self.title), non_empty(self.content)) else {
            return Err(ApiError::bad_request("Title and content are required"));
        };
        let tags = decode_list_value(&self.tags).into_vec();

        Ok(BlogPostInput {
            read_time: read_time(&content),
            title,
            content,
            excerpt: self.excerpt.unwrap_or_default(),
            tags: encode_list(&tags),
            image: non_empty(self.image),
            published: self.published.unwrap_or(false),
            featured: self.featured.unwrap_or(false),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostResponse {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    pub tags: Vec<String>,
    pub image: Option<String>,
    pub published: bool,
    pub featured: bool,
    pub read_time: Option<i32>,
    pub author_id: Uuid,
    pub author: Author,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<BlogPostWithAuthor> for BlogPostResponse {
    fn from(row: BlogPostWithAuthor) -> Self {
        let post = row.post;
        Self {
            tags: decode_list(&post.tags).into_vec(),
            id: post.id,
            title: post.title,
            slug: post.slug,
            content: post.content,
            excerpt: post.excerpt,
            image: post.image,
            published: post.published,
            featured: post.featured,
            read_time: post.read_time,
            author_id: post.author_id,
            author: row.author,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub content: Option<String>,
}

/// Comment author as shown to readers: no email.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentAuthor {
    pub id: Uuid,
    pub display_name: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: Uuid,
    pub content: String,
    pub approved: bool,
    pub author_id: Uuid,
    pub post_id: Uuid,
    pub author: CommentAuthor,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CommentWithContext> for CommentResponse {
    fn from(row: CommentWithContext) -> Self {
        let comment = row.comment;
        Self {
            id: comment.id,
            content: comment.content,
            approved: comment.approved,
            author_id: comment.author_id,
            post_id: comment.post_id,
            author: CommentAuthor {
                id: row.author.id,
                display_name: row.author.display_name,
                avatar: row.author.avatar,
            },
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CommentListResponse {
    pub success: bool,
    pub comments: Vec<CommentResponse>,
}

#[derive(Debug, Serialize)]
pub struct CommentCreatedResponse {
    pub success: bool,
    pub comment: CommentResponse,
    pub message: String,
}

// ============================================================================
// Slug and reading time
// ============================================================================

lazy_static::lazy_static! {
    /// Runs of anything that can't appear in a slug
    static ref SLUG_SEPARATOR: Regex = Regex::new(r"[^a-z0-9]+").unwrap();
}

/// Lowercased title with separators collapsed, suffixed with the creation
/// time in milliseconds.
pub fn slugify(title: &str, created_at: DateTime<Utc>) -> String {
    let lowered = title.to_lowercase();
    let base = SLUG_SEPARATOR.replace_all(&lowered, "-");
    let base = base.trim_matches('-');
    let base = if base.is_empty() { "post" } else { base };
    format!("{}-{}", base, created_at.timestamp_millis())
}

/// Minutes to read `content`, never less than one.
pub fn read_time(content: &str) -> i32 {
    let words = content.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE).max(1) as i32
}

// ============================================================================
// Helpers
// ============================================================================

/// Load a post the caller may see, or 404.
async fn visible_post(
    state: &AppState,
    id: Uuid,
    session: Option<&SessionUser>,
) -> Result<BlogPostWithAuthor, ApiError> {
    state
        .store
        .find_post(id)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch blog post", e))?
        .filter(|row| visible_to(row.post.published, session))
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))
}

// ============================================================================
// Post Handlers
// ============================================================================

/// GET /api/blog
pub async fn list_posts(
    State(state): State<AppState>,
    MaybeUser(session): MaybeUser,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = list_filter(&query, session)?;
    let posts = state
        .store
        .list_posts(filter)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch blog posts", e))?;

    Ok(Json(
        posts
            .into_iter()
            .map(BlogPostResponse::from)
            .collect::<Vec<_>>(),
    ))
}

/// GET /api/blog/{id}
pub async fn get_post(
    State(state): State<AppState>,
    MaybeUser(session): MaybeUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, NOT_FOUND)?;
    let post = visible_post(&state, id, session.as_ref()).await?;
    Ok(Json(BlogPostResponse::from(post)))
}

/// POST /api/blog
pub async fn create_post(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    JsonBody(payload): JsonBody<BlogPostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = payload.into_input()?;
    let slug = slugify(&input.title, Utc::now());

    let post = match state.store.insert_post(admin.id, slug, input).await {
        Ok(post) => post,
        Err(StoreError::Conflict(_)) => {
            return Err(ApiError::Conflict(
                "A post with this slug already exists".to_string(),
            ))
        }
        Err(e) => return Err(ApiError::internal("Failed to create blog post", e)),
    };

    tracing::info!(post_id = %post.post.id, slug = %post.post.slug, "Blog post created");
    Ok((StatusCode::CREATED, Json(BlogPostResponse::from(post))))
}

/// PUT /api/blog/{id}
/// The slug is fixed at creation and survives title changes.
pub async fn update_post(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<BlogPostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, NOT_FOUND)?;
    let input = payload.into_input()?;
    let post = state
        .store
        .update_post(id, input)
        .await
        .map_err(|e| ApiError::internal("Failed to update blog post", e))?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;

    Ok(Json(BlogPostResponse::from(post)))
}

/// DELETE /api/blog/{id}
pub async fn delete_post(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, NOT_FOUND)?;
    let deleted = state
        .store
        .delete_post(id)
        .await
        .map_err(|e| ApiError::internal("Failed to delete blog post", e))?;

    if !deleted {
        return Err(ApiError::not_found(NOT_FOUND));
    }
    tracing::info!(post_id = %id, "Blog post deleted");
    Ok(MessageResponse::ok("Blog post deleted successfully"))
}

// ============================================================================
// Comment Handlers
// ============================================================================

/// GET /api/blog/{id}/comments - approved comments only
pub async fn list_comments(
    State(state): State<AppState>,
    MaybeUser(session): MaybeUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, NOT_FOUND)?;
    visible_post(&state, id, session.as_ref()).await?;

    let comments = state
        .store
        .list_post_comments(id, CommentFilter::Approved)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch comments", e))?;

    Ok(Json(CommentListResponse {
        success: true,
        comments: comments.into_iter().map(CommentResponse::from).collect(),
    }))
}

/// POST /api/blog/{id}/comments
/// Admin comments publish immediately; everyone else's wait for moderation.
pub async fn create_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<CommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let content = payload
        .content
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::bad_request("Comment content is required"))?;

    let post_id = parse_id(&id, NOT_FOUND)?;
    visible_post(&state, post_id, Some(&user)).await?;

    let approved = user.is_admin();
    let comment = state
        .store
        .insert_comment(NewComment {
            content,
            approved,
            author_id: user.id,
            post_id,
        })
        .await
        .map_err(|e| match e {
            StoreError::MissingReference(_) => ApiError::not_found(NOT_FOUND),
            e => ApiError::internal("Failed to create comment", e),
        })?;

    tracing::info!(
        comment_id = %comment.comment.id,
        post_id = %post_id,
        approved,
        "Comment created"
    );

    let message = if approved {
        "Comment posted successfully"
    } else {
        "Comment submitted for approval"
    };
    Ok((
        StatusCode::CREATED,
        Json(CommentCreatedResponse {
            success: true,
            comment: comment.into(),
            message: message.to_string(),
        }),
    ))
}
