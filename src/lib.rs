//! Portfolio CMS - library for app logic and testing

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod list_field;
pub mod logging;
pub mod routes;
pub mod seed;
pub mod state;

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, patch, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer,
};

use crate::config::{AppConfig, ConfigError};
use crate::db::{MemoryStore, PgStore, Store};
use crate::state::AppState;

/// Request bodies above this are rejected with 413.
const BODY_LIMIT_BYTES: usize = 2 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database: {0}")]
    Database(#[from] sqlx::Error),
    #[error("admin seed: {0}")]
    Seed(#[from] seed::SeedError),
    #[error("invalid bind address {0}")]
    Address(String),
    #[error("server: {0}")]
    Io(#[from] std::io::Error),
}

/// CORS for the configured frontend origins. Credentials are allowed so the
/// session cookie travels with cross-origin requests.
pub fn configure_cors(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// Create and configure the application router.
pub fn create_app(state: AppState) -> Router {
    let cors = configure_cors(&state.config);

    Router::new()
        .route("/api/auth/register", post(routes::auth::register))
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/auth/logout", post(routes::auth::logout))
        .route("/api/auth/me", get(routes::auth::me))
        .route(
            "/api/projects",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/api/projects/{id}",
            get(routes::projects::get_project)
                .put(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route(
            "/api/blog",
            get(routes::blog::list_posts).post(routes::blog::create_post),
        )
        .route(
            "/api/blog/{id}",
            get(routes::blog::get_post)
                .put(routes::blog::update_post)
                .delete(routes::blog::delete_post),
        )
        .route(
            "/api/blog/{id}/comments",
            get(routes::blog::list_comments).post(routes::blog::create_comment),
        )
        .route(
            "/api/contact",
            get(routes::contact::contact_status).post(routes::contact::submit_contact),
        )
        .route("/api/admin/comments", get(routes::admin::list_comments))
        .route(
            "/api/admin/comments/{id}",
            patch(routes::admin::moderate_comment).delete(routes::admin::delete_comment),
        )
        .route("/api/admin/contacts", get(routes::admin::list_contacts))
        .route(
            "/api/admin/contacts/{id}",
            patch(routes::admin::update_contact_status).delete(routes::admin::delete_contact),
        )
        .route("/health", get(routes::health::health_ping))
        .route("/health/detailed", get(routes::health::health_detailed))
        .route("/health/database", get(routes::health::health_database))
        .route("/health/ready", get(routes::health::health_ready))
        .with_state(state)
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .layer(cors)
}

/// PostgreSQL when configured, otherwise the in-memory store.
async fn build_store(config: &AppConfig) -> Result<Arc<dyn Store>, StartupError> {
    match &config.database {
        Some(db_config) => {
            let pool = db::init_pool(db_config).await?;
            db::run_migrations(&pool).await?;
            Ok(Arc::new(PgStore::new(pool)))
        }
        None => {
            tracing::warn!("DATABASE_URL not set. Data is kept in memory and lost on restart.");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Run the server (used by main).
pub async fn run() -> Result<(), StartupError> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    let _log_guards = logging::init(&config);

    routes::health::init_start_time();

    let store = build_store(&config).await?;

    match &config.admin_seed {
        Some(admin) => {
            let outcome = seed::seed_admin(store.as_ref(), admin, config.bcrypt_cost).await?;
            if config.seed_sample_content {
                let (seed::SeedOutcome::Created(user) | seed::SeedOutcome::AlreadyExists(user)) =
                    outcome;
                seed::seed_sample_content(store.as_ref(), &user).await?;
            }
        }
        None if config.seed_sample_content => {
            tracing::warn!("SEED_SAMPLE_CONTENT needs ADMIN_EMAIL / ADMIN_PASSWORD; skipping");
        }
        None if config.is_production() => {
            tracing::warn!("ADMIN_EMAIL / ADMIN_PASSWORD not set; no admin account is seeded");
        }
        None => {}
    }

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|_| StartupError::Address(format!("{}:{}", config.host, config.port)))?;

    let app = create_app(AppState::new(store, config));

    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
