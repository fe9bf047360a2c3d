/**
 * Contact Routes
 * Anonymous contact-form submissions
 */
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::db::models::NewContact;
use crate::error::{ApiError, FieldError};
use crate::routes::{non_empty, JsonBody};
use crate::state::AppState;

/// Order in which field errors are reported.
const FIELD_ORDER: [&str; 4] = ["name", "email", "subject", "message"];

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ContactRequest {
    #[serde(default)]
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 5, message = "Subject must be at least 5 characters"))]
    pub subject: String,
    #[serde(default)]
    #[validate(length(min = 10, message = "Message must be at least 10 characters"))]
    pub message: String,
    pub project_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ContactSubmitted {
    pub success: bool,
    pub message: String,
    pub id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ContactStatusResponse {
    pub message: String,
}

fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut fields: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = field.to_string();
            errs.iter().map(move |err| FieldError {
                field: field.clone(),
                message: err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid {}", field)),
            })
        })
        .collect();
    fields.sort_by_key(|e| {
        FIELD_ORDER
            .iter()
            .position(|f| *f == e.field)
            .unwrap_or(FIELD_ORDER.len())
    });
    fields
}

/// GET /api/contact
pub async fn contact_status() -> impl IntoResponse {
    Json(ContactStatusResponse {
        message: "Contact API endpoint is working".to_string(),
    })
}

/// POST /api/contact
pub async fn submit_contact(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<ContactRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if let Err(errors) = payload.validate() {
        tracing::debug!("Contact form rejected: {}", errors);
        return Err(ApiError::Validation(field_errors(&errors)));
    }

    let contact = state
        .store
        .insert_contact(NewContact {
            name: payload.name,
            email: payload.email,
            subject: payload.subject,
            message: payload.message,
            project_type: non_empty(payload.project_type),
        })
        .await
        .map_err(|e| ApiError::internal("Failed to send message. Please try again.", e))?;

    tracing::info!(contact_id = %contact.id, "Contact message received");
    Ok((
        StatusCode::CREATED,
        Json(ContactSubmitted {
            success: true,
            message: "Message sent successfully!".to_string(),
            id: contact.id,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_short_field_is_reported_in_order() {
        let request = ContactRequest {
            name: "J".to_string(),
            email: "bad".to_string(),
            subject: "Hi".to_string(),
            message: "short".to_string(),
            project_type: None,
        };
        let errors = request.validate().unwrap_err();
        let fields: Vec<String> = field_errors(&errors).into_iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["name", "email", "subject", "message"]);
    }

    #[test]
    fn test_valid_request_passes() {
        let request = ContactRequest {
            name: "Jo".to_string(),
            email: "jo@example.com".to_string(),
            subject: "Hello there".to_string(),
            message: "I would like to work together.".to_string(),
            project_type: Some("web".to_string()),
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_messages_come_from_rules() {
        let request = ContactRequest {
            name: "Jo".to_string(),
            email: "jo@example.com".to_string(),
            subject: "Hello there".to_string(),
            message: "too short".to_string(),
            project_type: None,
        };
        let errors = field_errors(&request.validate().unwrap_err());
        assert_eq!(
            errors,
            vec![FieldError {
                field: "message".to_string(),
                message: "Message must be at least 10 characters".to_string(),
            }]
        );
    }
}
