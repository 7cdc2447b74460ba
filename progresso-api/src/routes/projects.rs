//! Project endpoints
//!
//! - `POST /api/projects` - create a project owned by the caller
//! - `GET /api/projects[?username=]` - list projects with members, tasks and progress
//! - `DELETE /api/projects/:project_id` - delete a project (owner only)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::parse_deadline,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use progresso_shared::{
    auth::middleware::SessionUser,
    models::project::{CreateProject, Project, ProjectDetails},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Create project request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    /// Display name
    #[validate(length(min = 1, max = 200, message = "Name must be 1 to 200 characters"))]
    pub name: String,

    /// Optional due date (`YYYY-MM-DD` or RFC 3339)
    pub deadline: Option<String>,
}

/// Create project response
#[derive(Debug, Serialize)]
pub struct CreateProjectResponse {
    /// Confirmation message
    pub message: String,

    /// The created project
    pub project: Project,
}

/// Query parameters for listing projects
#[derive(Debug, Default, Deserialize)]
pub struct ListProjectsQuery {
    /// Only projects this username is a member of
    pub username: Option<String>,
}

impl ListProjectsQuery {
    /// The username filter, ignoring blank values
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }
}

/// Create project endpoint
///
/// ```text
/// POST /api/projects
/// Content-Type: application/json
///
/// { "name": "Launch", "deadline": "2025-12-01" }
/// ```
///
/// # Errors
///
/// - `422 Unprocessable Entity`: empty/overlong name or unparsable deadline
pub async fn create_project(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Json(mut req): Json<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<CreateProjectResponse>)> {
    req.name = req.name.trim().to_string();
    req.validate()?;
    let deadline = parse_deadline("deadline", req.deadline.as_deref())?;

    let project = Project::create(
        &state.db,
        CreateProject {
            name: req.name,
            deadline,
            owner_id: user.id,
        },
    )
    .await?;

    tracing::info!(project_id = %project.id, owner_id = %user.id, "Project created");

    Ok((
        StatusCode::CREATED,
        Json(CreateProjectResponse {
            message: "Project created successfully".to_string(),
            project,
        }),
    ))
}

/// List projects endpoint
///
/// With `?username=`, only projects that user is a member of.
pub async fn list_projects(
    State(state): State<AppState>,
    Query(query): Query<ListProjectsQuery>,
) -> ApiResult<Json<Vec<ProjectDetails>>> {
    let projects = ProjectDetails::list(&state.db, query.username()).await?;

    Ok(Json(projects))
}

/// Delete project endpoint
///
/// Tasks and memberships go with it.
///
/// # Errors
///
/// - `403 Forbidden`: caller is not the owner
/// - `404 Not Found`: no such project
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let project = Project::find_by_id(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    if project.owner_id != user.id {
        return Err(ApiError::Forbidden(
            "Only the project owner can delete it".to_string(),
        ));
    }

    if !Project::delete(&state.db, project_id).await? {
        return Err(ApiError::NotFound("Project not found".to_string()));
    }

    tracing::info!(project_id = %project_id, "Project deleted");

    Ok(StatusCode::NO_CONTENT)
}
