//! Project model and database operations
//!
//! A project is owned by the user who created it and owns its tasks and
//! memberships; deleting it cascades to both.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE projects (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     name VARCHAR(200) NOT NULL,
//!     deadline DATE,
//!     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use super::project_member::{MemberDetails, ProjectMember};
use super::task::Task;
use super::user::UserSummary;
use crate::dashboard;

/// Project record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Unique project ID
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Optional due date
    pub deadline: Option<NaiveDate>,

    /// Creator and owner
    pub owner_id: Uuid,

    /// When the project was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a project
#[derive(Debug, Clone)]
pub struct CreateProject {
    /// Display name
    pub name: String,

    /// Optional due date
    pub deadline: Option<NaiveDate>,

    /// Owner (the creating user)
    pub owner_id: Uuid,
}

impl Project {
    /// Creates a project owned by `data.owner_id`
    pub async fn create(pool: &PgPool, data: CreateProject) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (name, deadline, owner_id)
            VALUES ($1, $2, $3)
            RETURNING id, name, deadline, owner_id, created_at
            "#,
        )
        .bind(data.name)
        .bind(data.deadline)
        .bind(data.owner_id)
        .fetch_one(pool)
        .await
    }

    /// Finds a project by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, deadline, owner_id, created_at
            FROM projects
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Lists every project, oldest first
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, deadline, owner_id, created_at
            FROM projects
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// Lists projects in which `username` is a member
    pub async fn list_by_member_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            SELECT p.id, p.name, p.deadline, p.owner_id, p.created_at
            FROM projects p
            WHERE EXISTS (
                SELECT 1
                FROM project_members pm
                JOIN users u ON u.id = pm.user_id
                WHERE pm.project_id = p.id AND u.username = $1
            )
            ORDER BY p.created_at ASC
            "#,
        )
        .bind(username)
        .fetch_all(pool)
        .await
    }

    /// Deletes a project together with its tasks and memberships
    ///
    /// Returns false if the project did not exist.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// What a user may do in one project
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct ProjectAccess {
    /// Project owner
    pub owner_id: Uuid,

    /// Whether the user holds a membership
    pub is_member: bool,
}

impl ProjectAccess {
    /// Loads the access of `user_id` to `project_id`
    ///
    /// Returns `None` if the project does not exist.
    pub async fn load(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ProjectAccess>(
            r#"
            SELECT p.owner_id,
                   EXISTS (
                       SELECT 1 FROM project_members pm
                       WHERE pm.project_id = p.id AND pm.user_id = $2
                   ) AS is_member
            FROM projects p
            WHERE p.id = $1
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Whether `user_id` owns the project
    pub fn is_owner(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }

    /// Owners and members may work on tasks and invite others
    pub fn can_collaborate(&self, user_id: Uuid) -> bool {
        self.is_owner(user_id) || self.is_member
    }
}

/// A project with its owner, members and tasks attached
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetails {
    /// The project row
    #[serde(flatten)]
    pub project: Project,

    /// Owner, if the user row still exists
    pub owner: Option<UserSummary>,

    /// Memberships, oldest first
    pub members: Vec<MemberDetails>,

    /// Tasks, oldest first
    pub tasks: Vec<Task>,

    /// Percentage of tasks that are done
    pub progress: u8,
}

impl ProjectDetails {
    /// Assembles details from already-loaded rows
    pub fn assemble(
        project: Project,
        owner: Option<UserSummary>,
        members: Vec<MemberDetails>,
        tasks: Vec<Task>,
    ) -> Self {
        let progress = dashboard::progress(tasks.iter().map(|t| t.status));
        Self {
            project,
            owner,
            members,
            tasks,
            progress,
        }
    }

    /// Loads owners, members and tasks for `projects` with three queries
    pub async fn load(pool: &PgPool, projects: Vec<Project>) -> Result<Vec<Self>, sqlx::Error> {
        if projects.is_empty() {
            return Ok(Vec::new());
        }

        let project_ids: Vec<Uuid> = projects.iter().map(|p| p.id).collect();
        let owner_ids: Vec<Uuid> = projects.iter().map(|p| p.owner_id).collect();

        let owners: HashMap<Uuid, UserSummary> = sqlx::query_as::<_, UserSummary>(
            "SELECT id, username FROM users WHERE id = ANY($1)",
        )
        .bind(&owner_ids)
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

        let mut members_by_project: HashMap<Uuid, Vec<MemberDetails>> = HashMap::new();
        for member in ProjectMember::list_details_by_projects(pool, &project_ids).await? {
            members_by_project
                .entry(member.project_id)
                .or_default()
                .push(member);
        }

        let mut tasks_by_project: HashMap<Uuid, Vec<Task>> = HashMap::new();
        for task in Task::list_by_projects(pool, &project_ids).await? {
            tasks_by_project.entry(task.project_id).or_default().push(task);
        }

        Ok(projects
            .into_iter()
            .map(|project| {
                let owner = owners.get(&project.owner_id).cloned();
                let members = members_by_project.remove(&project.id).unwrap_or_default();
                let tasks = tasks_by_project.remove(&project.id).unwrap_or_default();
                Self::assemble(project, owner, members, tasks)
            })
            .collect())
    }

    /// Lists projects with details, optionally only those `username` is a member of
    pub async fn list(pool: &PgPool, username: Option<&str>) -> Result<Vec<Self>, sqlx::Error> {
        let projects = match username {
            Some(username) => Project::list_by_member_username(pool, username).await?,
            None => Project::list_all(pool).await?,
        };

        Self::load(pool, projects).await
    }
}
