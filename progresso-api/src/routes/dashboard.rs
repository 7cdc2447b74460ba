//! Dashboard endpoint
//!
//! ```text
//! GET /api/dashboard?search=web&filter=active&username=alice
//! ```
//!
//! ```json
//! {
//!   "summary": { "totalProjects": 3, "completedTasks": 4, "inProgressTasks": 1, "totalMembers": 5 },
//!   "projects": [
//!     { "id": "uuid", "name": "Website", "progress": 50, "daysUntilDeadline": 6, "urgency": "warning", ... }
//!   ]
//! }
//! ```

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use progresso_shared::{
    dashboard::{Dashboard, ParseProjectFilterError, ProjectFilter},
    models::project::ProjectDetails,
};
use serde::Deserialize;

/// Dashboard query parameters
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    /// Case-insensitive name substring
    pub search: Option<String>,

    /// `all`, `active` or `completed`
    pub filter: Option<String>,

    /// Only projects this username is a member of
    pub username: Option<String>,
}

impl DashboardQuery {
    fn filter(&self) -> ApiResult<ProjectFilter> {
        self.filter
            .as_deref()
            .unwrap_or_default()
            .parse()
            .map_err(|e: ParseProjectFilterError| {
                ApiError::invalid_field("filter", e.to_string())
            })
    }

    fn username(&self) -> Option<&str> {
        self.username.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }
}

/// Dashboard handler
///
/// Recomputes progress, deadlines and counters on every request.
pub async fn dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> ApiResult<Json<Dashboard>> {
    let filter = query.filter()?;
    let projects = ProjectDetails::list(&state.db, query.username()).await?;

    let dashboard = Dashboard::build(
        projects,
        query.search.as_deref().unwrap_or_default(),
        filter,
        Utc::now(),
    );

    Ok(Json(dashboard))
}
