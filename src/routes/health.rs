/**
 * Health Routes
 * Liveness, readiness and data-store checks
 */
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::db::StoreError;
use crate::state::AppState;

const STORE_UNREACHABLE: &str = "Database unreachable";

lazy_static::lazy_static! {
    static ref SERVER_START: Instant = Instant::now();
}

/// Pin the uptime origin to server start rather than first health request.
pub fn init_start_time() {
    lazy_static::initialize(&SERVER_START);
}

fn uptime_secs() -> u64 {
    SERVER_START.elapsed().as_secs()
}

/// Result of pinging one dependency
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCheck {
    pub status: String,
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServiceCheck {
    fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthChecks {
    pub database: ServiceCheck,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedHealthResponse {
    pub status: String,
    pub environment: String,
    pub timestamp: DateTime<Utc>,
    pub uptime: u64,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub uptime: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SimpleHealthResponse {
    pub status: String,
}

async fn check_store(state: &AppState) -> ServiceCheck {
    let backend = state.store.backend().to_string();
    match state.store.ping().await {
        Ok(elapsed) => ServiceCheck {
            status: "healthy".to_string(),
            backend,
            response_time: Some(elapsed.as_millis() as u64),
            error: None,
        },
        Err(e) => unhealthy(backend, &e),
    }
}

/// The cause stays in the logs; callers only learn the store is unreachable.
fn unhealthy(backend: String, cause: &StoreError) -> ServiceCheck {
    tracing::warn!("Store health check failed: {}", cause);
    ServiceCheck {
        status: "unhealthy".to_string(),
        backend,
        response_time: None,
        error: Some(STORE_UNREACHABLE.to_string()),
    }
}

/// GET /health
pub async fn health_ping() -> impl IntoResponse {
    Json(SimpleHealthResponse {
        status: "ok".to_string(),
    })
}

/// GET /health/detailed
/// Always 200 so callers can tell the process is up even when the store isn't.
pub async fn health_detailed(State(state): State<AppState>) -> impl IntoResponse {
    let database = check_store(&state).await;
    let status = if database.is_healthy() { "ok" } else { "degraded" };

    Json(DetailedHealthResponse {
        status: status.to_string(),
        environment: state.config.environment.clone(),
        timestamp: Utc::now(),
        uptime: uptime_secs(),
        checks: HealthChecks { database },
    })
}

/// GET /health/database
pub async fn health_database(State(state): State<AppState>) -> impl IntoResponse {
    let check = check_store(&state).await;
    let code = if check.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(check))
}

/// GET /health/ready
/// Ready only when the store answers; every API route depends on it.
pub async fn health_ready(State(state): State<AppState>) -> impl IntoResponse {
    let ready = check_store(&state).await.is_healthy();
    let (code, status, reason) = if ready {
        (StatusCode::OK, "ready", None)
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            "not ready",
            Some("Data store is not reachable".to_string()),
        )
    };

    (
        code,
        Json(ReadyResponse {
            status: status.to_string(),
            timestamp: Utc::now(),
            uptime: uptime_secs(),
            reason,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    fn test_router() -> Router {
        Router::new()
            .route("/health", get(health_ping))
            .route("/health/detailed", get(health_detailed))
            .route("/health/database", get(health_database))
            .route("/health/ready", get(health_ready))
            .with_state(AppState::in_memory(AppConfig::default()))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(app: Router, uri: &str) -> (StatusCode, T) {
        let req = Request::get(uri).body(Body::empty()).unwrap();
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value: T = serde_json::from_slice(&body).unwrap();
        (status, value)
    }

    #[tokio::test]
    async fn test_health_ping_returns_ok() {
        init_start_time();
        let (status, body) = get_json::<SimpleHealthResponse>(test_router(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "ok");
    }

    #[tokio::test]
    async fn test_health_database_reports_memory_backend() {
        let (status, body) = get_json::<ServiceCheck>(test_router(), "/health/database").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "healthy");
        assert_eq!(body.backend, "memory");
        assert!(body.response_time.is_some());
    }

    #[tokio::test]
    async fn test_health_detailed_returns_ok() {
        let (status, body) =
            get_json::<DetailedHealthResponse>(test_router(), "/health/detailed").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "ok");
        assert_eq!(body.environment, "development");
        assert!(body.checks.database.is_healthy());
    }

    #[test]
    fn test_unhealthy_check_hides_cause() {
        let check = unhealthy(
            "postgres".to_string(),
            &StoreError::Database(sqlx::Error::PoolTimedOut),
        );
        assert!(!check.is_healthy());
        assert_eq!(check.error.as_deref(), Some("Database unreachable"));
        assert!(check.response_time.is_none());
    }

    #[tokio::test]
    async fn test_health_ready_returns_ready() {
        let (status, body) = get_json::<ReadyResponse>(test_router(), "/health/ready").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "ready");
        assert!(body.reason.is_none());
    }
}
