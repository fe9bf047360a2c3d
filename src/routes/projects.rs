/**
 * Project Routes
 * Public portfolio listing plus admin CRUD
 */
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::auth::{AdminUser, MaybeUser};
use crate::db::models::{Author, ProjectInput, ProjectWithAuthor};
use crate::error::ApiError;
use crate::list_field::{decode_list, decode_list_value, encode_list};
use crate::routes::{
    list_filter, non_empty, parse_id, visible_to, JsonBody, ListQuery, MessageResponse,
};
use crate::state::AppState;

const NOT_FOUND: &str = "Project not found";

// ============================================================================
// Request/Response Types
// ============================================================================

/// Body for POST /api/projects and PUT /api/projects/{id}.
/// `technologies` may be an array or a comma-separated string.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub image: Option<String>,
    #[serde(default)]
    pub technologies: Value,
    pub github_url: Option<String>,
    pub live_url: Option<String>,
    pub featured: Option<bool>,
    pub published: Option<bool>,
}

impl ProjectRequest {
    /// Full-document semantics: anything missing resets to its default.
    pub fn into_input(self) -> Result<ProjectInput, ApiError> {
        let (Some(title), Some(description)) = (non_empty(self.title), non_empty(self.description))
        else {
            return Err(ApiError::bad_request("Title and description are required"));
        };
        let technologies = decode_list_value(&self.technologies).into_vec();

        Ok(ProjectInput {
            title,
            description,
            content: self.content.unwrap_or_default(),
            image: non_empty(self.image),
            technologies: encode_list(&technologies),
            github_url: non_empty(self.github_url),
            live_url: non_empty(self.live_url),
            featured: self.featured.unwrap_or(false),
            published: self.published.unwrap_or(false),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub content: String,
    pub image: Option<String>,
    pub technologies: Vec<String>,
    pub github_url: Option<String>,
    pub live_url: Option<String>,
    pub featured: bool,
    pub published: bool,
    pub author_id: Uuid,
    pub author: Author,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProjectWithAuthor> for ProjectResponse {
    fn from(row: ProjectWithAuthor) -> Self {
        let project = row.project;
        Self {
            technologies: decode_list(&project.technologies).into_vec(),
            id: project.id,
            title: project.title,
            description: project.description,
            content: project.content,
            image: project.image,
            github_url: project.github_url,
            live_url: project.live_url,
            featured: project.featured,
            published: project.published,
            author_id: project.author_id,
            author: row.author,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/projects
pub async fn list_projects(
    State(state): State<AppState>,
    MaybeUser(session): MaybeUser,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = list_filter(&query, session)?;
    let projects = state
        .store
        .list_projects(filter)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch projects", e))?;

    Ok(Json(
        projects
            .into_iter()
            .map(ProjectResponse::from)
            .collect::<Vec<_>>(),
    ))
}

/// GET /api/projects/{id}
pub async fn get_project(
    State(state): State<AppState>,
    MaybeUser(session): MaybeUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, NOT_FOUND)?;
    let project = state
        .store
        .find_project(id)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch project", e))?
        .filter(|row| visible_to(row.project.published, session.as_ref()))
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;

    Ok(Json(ProjectResponse::from(project)))
}

/// POST /api/projects
pub async fn create_project(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    JsonBody(payload): JsonBody<ProjectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = payload.into_input()?;
    let project = state
        .store
        .insert_project(admin.id, input)
        .await
        .map_err(|e| ApiError::internal("Failed to create project", e))?;

    tracing::info!(project_id = %project.project.id, "Project created");
    Ok((StatusCode::CREATED, Json(ProjectResponse::from(project))))
}

/// PUT /api/projects/{id}
pub async fn update_project(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<ProjectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, NOT_FOUND)?;
    let input = payload.into_input()?;
    let project = state
        .store
        .update_project(id, input)
        .await
        .map_err(|e| ApiError::internal("Failed to update project", e))?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;

    Ok(Json(ProjectResponse::from(project)))
}

/// DELETE /api/projects/{id}
pub async fn delete_project(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, NOT_FOUND)?;
    let deleted = state
        .store
        .delete_project(id)
        .await
        .map_err(|e| ApiError::internal("Failed to delete project", e))?;

    if !deleted {
        return Err(ApiError::not_found(NOT_FOUND));
    }
    tracing::info!(project_id = %id, "Project deleted");
    Ok(MessageResponse::ok("Project deleted successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: Value) -> ProjectRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_missing_title_is_rejected() {
        let err = request(json!({ "description": "d" }))
            .into_input()
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Title and description are required");
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let input = request(json!({ "title": "t", "description": "d" }))
            .into_input()
            .unwrap();
        assert_eq!(input.content, "");
        assert_eq!(input.technologies, "[]");
        assert!(!input.featured);
        assert!(!input.published);
        assert!(input.image.is_none());
    }

    #[test]
    fn test_comma_technologies_are_stored_as_json() {
        let from_string = request(json!({
            "title": "t",
            "description": "d",
            "technologies": "Rust, Axum,  Postgres"
        }))
        .into_input()
        .unwrap();
        let from_array = request(json!({
            "title": "t",
            "description": "d",
            "technologies": ["Rust", "Axum", "Postgres"]
        }))
        .into_input()
        .unwrap();
        assert_eq!(from_string.technologies, r#"["Rust","Axum","Postgres"]"#);
        assert_eq!(from_string.technologies, from_array.technologies);
    }
}
