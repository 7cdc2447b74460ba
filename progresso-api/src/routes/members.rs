//! Project membership endpoints
//!
//! - `POST /api/user/projects/projectMember` - add the caller to a project
//! - `POST /api/projects/:project_id/members` - add a user by username
//! - `DELETE /api/projects/:project_id/members/:member_id` - remove a membership

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::require_collaborator,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use progresso_shared::{
    auth::middleware::SessionUser,
    models::{project::ProjectAccess, project_member::ProjectMember, user::User},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Add member request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberRequest {
    /// Project to join
    pub project_id: Uuid,
}

/// Invite request
#[derive(Debug, Deserialize, Validate)]
pub struct InviteMemberRequest {
    /// Login name of the user to add
    #[validate(length(min = 1, max = 64, message = "Username must be 1 to 64 characters"))]
    pub username: String,
}

/// Add member response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberResponse {
    /// Confirmation message
    pub message: String,

    /// The created membership
    pub project_member: ProjectMember,
}

/// Add the session user to a project
///
/// ```text
/// POST /api/user/projects/projectMember
/// Content-Type: application/json
///
/// { "projectId": "uuid" }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: the session user no longer exists
/// - `404 Not Found`: project does not exist (nothing is written)
/// - `409 Conflict`: already a member
pub async fn add_project_member(
    State(state): State<AppState>,
    Extension(session_user): Extension<SessionUser>,
    Json(req): Json<AddMemberRequest>,
) -> ApiResult<(StatusCode, Json<AddMemberResponse>)> {
    let user = User::find_by_id(&state.db, session_user.id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("get user first".to_string()))?;

    let project_member = ProjectMember::add_to_existing_project(&state.db, user.id, req.project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project does not exist".to_string()))?;

    tracing::info!(
        project_id = %project_member.project_id,
        user_id = %project_member.user_id,
        "Member added"
    );

    Ok((
        StatusCode::CREATED,
        Json(AddMemberResponse {
            message: "Member added successfully".to_string(),
            project_member,
        }),
    ))
}

/// Add another user to a project by username
///
/// ```text
/// POST /api/projects/:project_id/members
/// Content-Type: application/json
///
/// { "username": "bob" }
/// ```
///
/// # Errors
///
/// - `403 Forbidden`: caller is neither owner nor member
/// - `404 Not Found`: no such project, or no user with that username
/// - `409 Conflict`: already a member
/// - `422 Unprocessable Entity`: blank username
pub async fn invite_project_member(
    State(state): State<AppState>,
    Extension(session_user): Extension<SessionUser>,
    Path(project_id): Path<Uuid>,
    Json(mut req): Json<InviteMemberRequest>,
) -> ApiResult<(StatusCode, Json<AddMemberResponse>)> {
    req.username = req.username.trim().to_string();
    req.validate()?;

    require_collaborator(&state.db, project_id, &session_user).await?;

    let invitee = User::find_by_username(&state.db, &req.username)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User '{}' not found", req.username)))?;

    let project_member = ProjectMember::add_to_existing_project(&state.db, invitee.id, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project does not exist".to_string()))?;

    tracing::info!(
        project_id = %project_id,
        user_id = %invitee.id,
        invited_by = %session_user.id,
        "Member invited"
    );

    Ok((
        StatusCode::CREATED,
        Json(AddMemberResponse {
            message: "Member added successfully".to_string(),
            project_member,
        }),
    ))
}

/// Remove a membership from a project
///
/// The owner may remove anyone; a member may remove only their own membership.
///
/// # Errors
///
/// - `403 Forbidden`: caller may not remove this membership
/// - `404 Not Found`: no such project, or no such membership in it
pub async fn remove_project_member(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path((project_id, member_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    let access = ProjectAccess::load(&state.db, project_id, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    let member = ProjectMember::find_in_project(&state.db, project_id, member_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Member not found in project".to_string()))?;

    if !access.is_owner(user.id) && member.user_id != user.id {
        return Err(ApiError::Forbidden(
            "Only the project owner can remove other members".to_string(),
        ));
    }

    if !ProjectMember::delete(&state.db, project_id, member_id).await? {
        return Err(ApiError::NotFound("Member not found in project".to_string()));
    }

    tracing::info!(project_id = %project_id, member_id = %member_id, "Member removed");

    Ok(StatusCode::NO_CONTENT)
}
