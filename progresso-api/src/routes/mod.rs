//! API route handlers
//!
//! Handlers are organized by resource:
//!
//! - `health`: Health check endpoint
//! - `auth`: Login, logout and session endpoints
//! - `user`: Current session user
//! - `projects`: Project create/list/delete
//! - `members`: Project membership join/invite/remove
//! - `tasks`: Task create, status changes, delete
//! - `dashboard`: Dashboard cards and summary

pub mod auth;
pub mod dashboard;
pub mod health;
pub mod members;
pub mod projects;
pub mod tasks;
pub mod user;

use crate::error::{ApiError, ApiResult};
use chrono::{DateTime, NaiveDate};
use progresso_shared::{auth::middleware::SessionUser, models::project::ProjectAccess};
use sqlx::PgPool;
use uuid::Uuid;

/// Loads the caller's access to a project and requires owner or member
///
/// # Errors
///
/// - `404 Not Found`: no such project
/// - `403 Forbidden`: caller is neither owner nor member
pub(crate) async fn require_collaborator(
    db: &PgPool,
    project_id: Uuid,
    user: &SessionUser,
) -> ApiResult<ProjectAccess> {
    let access = ProjectAccess::load(db, project_id, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    if !access.can_collaborate(user.id) {
        tracing::debug!(project_id = %project_id, user_id = %user.id, "Not a project collaborator");
        return Err(ApiError::Forbidden(
            "Only the project owner or its members can do this".to_string(),
        ));
    }

    Ok(access)
}

/// Parses an optional calendar date from request input
///
/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp, whose date part is kept.
/// Missing or blank input means no deadline.
pub(crate) fn parse_deadline(field: &str, raw: Option<&str>) -> ApiResult<Option<NaiveDate>> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(raw) => raw,
    };

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(Some(date));
    }

    DateTime::parse_from_rfc3339(raw)
        .map(|ts| Some(ts.date_naive()))
        .map_err(|_| {
            ApiError::invalid_field(field, "Expected a date (YYYY-MM-DD) or an RFC 3339 timestamp")
        })
}
