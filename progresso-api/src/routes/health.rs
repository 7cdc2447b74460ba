//! Health check endpoint
//!
//! ```text
//! GET /health
//! ```
//!
//! ```json
//! {
//!   "status": "healthy",
//!   "version": "0.1.0",
//!   "database": "connected",
//!   "pool": { "active": 1, "idle": 4, "total": 5 }
//! }
//! ```

use crate::app::AppState;
use axum::{extract::State, http::StatusCode, Json};
use progresso_shared::db::pool::{get_pool_stats, health_check as database_health_check};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Application version
    pub version: String,

    /// Database status
    pub database: String,

    /// Connection pool usage
    pub pool: PoolHealth,
}

/// Connection pool usage
#[derive(Debug, Serialize, Deserialize)]
pub struct PoolHealth {
    /// Connections checked out
    pub active: usize,

    /// Idle connections
    pub idle: usize,

    /// Open connections
    pub total: usize,
}

/// Health check handler
///
/// Reports `503` with status `degraded` when the database is unreachable.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let connected = match database_health_check(&state.db).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            false
        }
    };

    let (code, status, database) = if connected {
        (StatusCode::OK, "healthy", "connected")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded", "disconnected")
    };

    let stats = get_pool_stats(&state.db);

    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: database.to_string(),
            pool: PoolHealth {
                active: stats.active_connections,
                idle: stats.idle_connections,
                total: stats.total_connections,
            },
        }),
    )
}
