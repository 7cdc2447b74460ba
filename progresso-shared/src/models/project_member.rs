//! Project membership model and database operations
//!
//! A membership links a user to a project. The pair is unique, so adding the
//! same user twice fails with a unique-constraint violation.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE project_members (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
//!     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     CONSTRAINT project_members_user_project_key UNIQUE (user_id, project_id)
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::user::UserSummary;

/// Name of the unique constraint on `(user_id, project_id)`
pub const UNIQUE_MEMBERSHIP_CONSTRAINT: &str = "project_members_user_project_key";

/// Membership record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMember {
    /// Membership ID
    pub id: Uuid,

    /// Member user
    pub user_id: Uuid,

    /// Project joined
    pub project_id: Uuid,

    /// When the user joined
    pub created_at: DateTime<Utc>,
}

/// Membership with the member's public user data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDetails {
    /// Membership ID
    pub id: Uuid,

    /// Member user ID
    pub user_id: Uuid,

    /// Project ID
    pub project_id: Uuid,

    /// Member's public data
    pub user: UserSummary,
}

#[derive(sqlx::FromRow)]
struct MemberRow {
    id: Uuid,
    user_id: Uuid,
    project_id: Uuid,
    username: String,
}

impl From<MemberRow> for MemberDetails {
    fn from(row: MemberRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            project_id: row.project_id,
            user: UserSummary {
                id: row.user_id,
                username: row.username,
            },
        }
    }
}

impl ProjectMember {
    /// Adds `user_id` to an existing project
    ///
    /// Returns `None` when the project does not exist, in which case no row
    /// is written. Existence check and insert are one statement; a project
    /// deleted in between is rejected by the foreign key.
    ///
    /// # Errors
    ///
    /// A duplicate membership fails with a unique violation on
    /// [`UNIQUE_MEMBERSHIP_CONSTRAINT`].
    pub async fn add_to_existing_project(
        pool: &PgPool,
        user_id: Uuid,
        project_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ProjectMember>(
            r#"
            INSERT INTO project_members (user_id, project_id)
            SELECT $1, p.id
            FROM projects p
            WHERE p.id = $2
            RETURNING id, user_id, project_id, created_at
            "#,
        )
        .bind(user_id)
        .bind(project_id)
        .fetch_optional(pool)
        .await
    }

    /// Finds a membership by ID within a project
    pub async fn find_in_project(
        pool: &PgPool,
        project_id: Uuid,
        member_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ProjectMember>(
            r#"
            SELECT id, user_id, project_id, created_at
            FROM project_members
            WHERE id = $1 AND project_id = $2
            "#,
        )
        .bind(member_id)
        .bind(project_id)
        .fetch_optional(pool)
        .await
    }

    /// Removes a membership from a project; returns false if it did not exist
    pub async fn delete(pool: &PgPool, project_id: Uuid, member_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM project_members WHERE id = $1 AND project_id = $2")
            .bind(member_id)
            .bind(project_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts memberships of a project
    pub async fn count_by_project(pool: &PgPool, project_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM project_members WHERE project_id = $1")
                .bind(project_id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }

    /// Lists memberships with usernames for several projects, oldest first
    pub async fn list_details_by_projects(
        pool: &PgPool,
        project_ids: &[Uuid],
    ) -> Result<Vec<MemberDetails>, sqlx::Error> {
        let rows = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT pm.id, pm.user_id, pm.project_id, u.username
            FROM project_members pm
            JOIN users u ON u.id = pm.user_id
            WHERE pm.project_id = ANY($1)
            ORDER BY pm.created_at ASC
            "#,
        )
        .bind(project_ids)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(MemberDetails::from).collect())
    }

    /// Finds a member of `project_id` by username, ignoring case
    pub async fn find_member_by_username(
        pool: &PgPool,
        project_id: Uuid,
        username: &str,
    ) -> Result<Option<UserSummary>, sqlx::Error> {
        sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT u.id, u.username
            FROM project_members pm
            JOIN users u ON u.id = pm.user_id
            WHERE pm.project_id = $1 AND LOWER(u.username) = LOWER($2)
            ORDER BY pm.created_at ASC
            LIMIT 1
            "#,
        )
        .bind(project_id)
        .bind(username.trim())
        .fetch_optional(pool)
        .await
    }
}
