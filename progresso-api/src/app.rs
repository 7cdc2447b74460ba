//! Application state and router builder
//!
//! # Example
//!
//! ```no_run
//! use progresso_api::{app::{build_router, AppState}, config::Config};
//! use sqlx::PgPool;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! let pool = PgPool::connect(&config.database.url).await?;
//! let app = build_router(AppState::new(pool, config));
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

use crate::{config::Config, error::ApiError, routes};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, patch, post},
    Router,
};
use progresso_shared::auth::middleware::{session_claims, SessionUser};
use sqlx::PgPool;
use std::{future::Future, sync::Arc};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned into every handler through Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Secret used to sign and verify session tokens
    pub fn session_secret(&self) -> &str {
        &self.config.session.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /
/// ├── GET  /health
/// └── /api
///     ├── POST   /auth/login                          (public)
///     ├── POST   /auth/logout                         (public)
///     ├── GET    /auth/session
///     ├── GET    /user
///     ├── POST   /user/projects/projectMember
///     ├── GET    /projects[?username=]
///     ├── POST   /projects
///     ├── POST   /projects/task
///     ├── DELETE /projects/:project_id
///     ├── POST   /projects/:project_id/members
///     ├── DELETE /projects/:project_id/members/:member_id
///     ├── PATCH  /tasks/:task_id/status
///     ├── POST   /tasks/:task_id/advance
///     ├── DELETE /tasks/:task_id
///     └── GET    /dashboard
/// ```
pub fn build_router(state: AppState) -> Router {
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let public_routes = Router::new()
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/logout", post(routes::auth::logout));

    let protected_routes = Router::new()
        .route("/auth/session", get(routes::auth::session))
        .route("/user", get(routes::user::current_user))
        .route(
            "/user/projects/projectMember",
            post(routes::members::add_project_member),
        )
        .route(
            "/projects",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route("/projects/task", post(routes::tasks::create_task))
        .route("/projects/:project_id", delete(routes::projects::delete_project))
        .route(
            "/projects/:project_id/members",
            post(routes::members::invite_project_member),
        )
        .route(
            "/projects/:project_id/members/:member_id",
            delete(routes::members::remove_project_member),
        )
        .route("/tasks/:task_id", delete(routes::tasks::delete_task))
        .route("/tasks/:task_id/status", patch(routes::tasks::update_task_status))
        .route("/tasks/:task_id/advance", post(routes::tasks::advance_task_status))
        .route("/dashboard", get(routes::dashboard::dashboard))
        .route_layer(middleware::from_fn_with_state(state.clone(), session_auth_layer));

    let cors = if state.config.api.cors_origins.is_empty() {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/api", public_routes.merge(protected_routes))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// Resolves when `signal` fires, to drive graceful shutdown
///
/// If the signal cannot be installed the server keeps running; the error is
/// logged and this never resolves.
pub async fn shutdown_signal<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}

/// Session authentication layer
///
/// Validates the bearer token or session cookie and injects the
/// `SessionUser` and its `SessionClaims` into request extensions.
async fn session_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = session_claims(req.headers(), state.session_secret()).map_err(|e| {
        tracing::debug!(error = %e, path = %req.uri().path(), "Rejected unauthenticated request");
        ApiError::from(e)
    })?;

    req.extensions_mut().insert(SessionUser::from(claims.clone()));
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
