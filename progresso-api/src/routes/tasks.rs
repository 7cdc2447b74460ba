//! Task endpoints
//!
//! - `POST /api/projects/task` - create a task in a project
//! - `PATCH /api/tasks/:task_id/status` - set any status
//! - `POST /api/tasks/:task_id/advance` - move to the next status in the cycle
//! - `DELETE /api/tasks/:task_id` - delete a task
//!
//! Only the project owner and its members may create or change tasks.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{parse_deadline, require_collaborator},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use progresso_shared::{
    auth::middleware::SessionUser,
    models::{
        project_member::ProjectMember,
        task::{CreateTask, Task, TaskStatus},
    },
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Create task request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    /// Short title
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Initial status (default `TODO`)
    pub status: Option<TaskStatus>,

    /// Owning project
    pub project_id: Uuid,

    /// Optional due date (`YYYY-MM-DD` or RFC 3339)
    pub deadline: Option<String>,

    /// Username of a project member to assign
    pub assignee_username: Option<String>,
}

/// Create task response
#[derive(Debug, Serialize)]
pub struct CreateTaskResponse {
    /// Confirmation message
    pub message: String,

    /// The created task
    pub task: Task,
}

/// Status update request
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    /// New status
    pub status: TaskStatus,
}

/// Create task endpoint
///
/// ```text
/// POST /api/projects/task
/// Content-Type: application/json
///
/// {
///   "title": "Spec",
///   "projectId": "uuid",
///   "status": "TODO",
///   "assigneeUsername": "bob"
/// }
/// ```
///
/// # Errors
///
/// - `403 Forbidden`: caller is neither owner nor member of the project
/// - `404 Not Found`: project does not exist
/// - `422 Unprocessable Entity`: bad title/deadline, or assignee is not a member
pub async fn create_task(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Json(mut req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<CreateTaskResponse>)> {
    req.title = req.title.trim().to_string();
    req.validate()?;
    let deadline = parse_deadline("deadline", req.deadline.as_deref())?;

    require_collaborator(&state.db, req.project_id, &user).await?;

    let assignee_id = match req.assignee_username.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(username) => {
            let member = ProjectMember::find_member_by_username(&state.db, req.project_id, username)
                .await?
                .ok_or_else(|| {
                    ApiError::invalid_field("assigneeUsername", "Assignee must be a project member")
                })?;
            Some(member.id)
        }
    };

    let description = req
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    let task = Task::create(
        &state.db,
        CreateTask {
            title: req.title,
            description,
            status: req.status.unwrap_or_default(),
            deadline,
            project_id: req.project_id,
            assignee_id,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    tracing::info!(task_id = %task.id, project_id = %task.project_id, "Task created");

    Ok((
        StatusCode::CREATED,
        Json(CreateTaskResponse {
            message: "Task created successfully".to_string(),
            task,
        }),
    ))
}

/// Loads a task and requires the caller to collaborate on its project
async fn authorize_task(state: &AppState, task_id: Uuid, user: &SessionUser) -> ApiResult<Task> {
    let task = Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    require_collaborator(&state.db, task.project_id, user).await?;

    Ok(task)
}

/// Update task status endpoint
///
/// Any status may follow any other.
pub async fn update_task_status(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<Json<Task>> {
    authorize_task(&state, task_id, &user).await?;

    let task = Task::update_status(&state.db, task_id, req.status)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    tracing::debug!(task_id = %task.id, status = %task.status, "Task status set");

    Ok(Json(task))
}

/// Advance task status endpoint
///
/// `TODO → IN_PROGRESS → DONE → TODO`
pub async fn advance_task_status(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    authorize_task(&state, task_id, &user).await?;

    let task = Task::advance_status(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    tracing::debug!(task_id = %task.id, status = %task.status, "Task status advanced");

    Ok(Json(task))
}

/// Delete task endpoint
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    authorize_task(&state, task_id, &user).await?;

    if !Task::delete(&state.db, task_id).await? {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    tracing::info!(task_id = %task_id, user_id = %user.id, "Task deleted");

    Ok(StatusCode::NO_CONTENT)
}
