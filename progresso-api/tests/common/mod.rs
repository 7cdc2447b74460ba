/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - Test database setup (skipped when `DATABASE_URL` is unset)
/// - Unique usernames so runs never collide
/// - Login and JSON request helpers

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use progresso_api::app::{build_router, AppState};
use progresso_api::config::Config;
use progresso_shared::db::migrations::run_migrations;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

const TEST_SECRET: &str = "integration-test-secret-at-least-32-bytes";

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    created_projects: std::sync::Mutex<Vec<Uuid>>,
}

/// A logged-in user
pub struct Session {
    pub user_id: Uuid,
    pub username: String,
    pub token: String,
}

impl Session {
    /// Returns authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

impl TestContext {
    /// Connects to the test database, or returns `None` when none is configured
    pub async fn new() -> Option<Self> {
        dotenvy::dotenv().ok();
        let database_url = match std::env::var("DATABASE_URL") {
            Ok(url) => url,
            Err(_) => {
                eprintln!("DATABASE_URL not set; skipping database integration test");
                return None;
            }
        };

        let config = Config::from_lookup(|name| match name {
            "DATABASE_URL" => Some(database_url.clone()),
            "DATABASE_MAX_CONNECTIONS" => Some("5".to_string()),
            "JWT_SECRET" => Some(TEST_SECRET.to_string()),
            _ => None,
        })
        .expect("test configuration");

        let db = PgPool::connect(&config.database.url)
            .await
            .expect("connect to test database");
        run_migrations(&db).await.expect("run migrations");

        let app = build_router(AppState::new(db.clone(), config));

        Some(TestContext {
            db,
            app,
            created_projects: std::sync::Mutex::new(Vec::new()),
        })
    }

    /// Sends a request and returns the status with the parsed JSON body
    ///
    /// Empty bodies (e.g. `204 No Content`) come back as `Value::Null`.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        session: Option<&Session>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(session) = session {
            builder = builder.header(header::AUTHORIZATION, session.auth_header());
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, json)
    }

    /// Logs in through the API, creating the account on first use
    pub async fn login(&self, username: &str, password: &str) -> Session {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/auth/login",
                None,
                Some(serde_json::json!({ "username": username, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");

        Session {
            user_id: body["user"]["id"].as_str().unwrap().parse().unwrap(),
            username: body["user"]["username"].as_str().unwrap().to_string(),
            token: body["token"].as_str().unwrap().to_string(),
        }
    }

    /// Creates a project through the API and remembers it for cleanup
    pub async fn create_project(&self, session: &Session, name: &str, deadline: Option<&str>) -> Uuid {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/projects",
                Some(session),
                Some(serde_json::json!({ "name": name, "deadline": deadline })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create project failed: {body}");

        let id: Uuid = body["project"]["id"].as_str().unwrap().parse().unwrap();
        self.created_projects.lock().unwrap().push(id);
        id
    }

    /// Cleans up test data
    ///
    /// Projects cascade to their tasks and memberships. Users are left in
    /// place; their names are unique per run.
    pub async fn cleanup(&self) {
        let ids: Vec<Uuid> = self.created_projects.lock().unwrap().drain(..).collect();
        sqlx::query("DELETE FROM projects WHERE id = ANY($1)")
            .bind(&ids)
            .execute(&self.db)
            .await
            .unwrap();
    }
}

/// A username no other test run will use
pub fn unique_username(prefix: &str) -> String {
    format!("{}-{}", prefix, &Uuid::new_v4().simple().to_string()[..12])
}
