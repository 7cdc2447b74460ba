//! Task model and database operations
//!
//! Tasks belong to a project and carry a user-driven status. Any status can be
//! set from any other; the dashboard's one-click control walks the cycle
//! below via [`TaskStatus::next`].
//!
//! ```text
//! TODO → IN_PROGRESS → DONE
//!   ↑                    │
//!   └────────────────────┘
//! ```
//!
//! # Schema
//!
//! ```sql
//! CREATE TYPE task_status AS ENUM ('TODO', 'IN_PROGRESS', 'DONE');
//!
//! CREATE TABLE tasks (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     title VARCHAR(200) NOT NULL,
//!     description TEXT,
//!     status task_status NOT NULL DEFAULT 'TODO',
//!     deadline DATE,
//!     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
//!     assignee_id UUID REFERENCES users(id) ON DELETE SET NULL,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Task status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Not started
    #[default]
    Todo,

    /// Being worked on
    InProgress,

    /// Finished
    Done,
}

impl TaskStatus {
    /// All statuses in cycle order
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done];

    /// Wire/database representation
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "TODO",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Done => "DONE",
        }
    }

    /// Cyclic successor used by the one-click advance control
    pub fn next(self) -> TaskStatus {
        match self {
            TaskStatus::Todo => TaskStatus::InProgress,
            TaskStatus::InProgress => TaskStatus::Done,
            TaskStatus::Done => TaskStatus::Todo,
        }
    }

    /// Whether the task is finished
    pub fn is_done(&self) -> bool {
        matches!(self, TaskStatus::Done)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown task status '{0}', expected TODO, IN_PROGRESS or DONE")]
pub struct ParseTaskStatusError(pub String);

impl FromStr for TaskStatus {
    type Err = ParseTaskStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TODO" => Ok(TaskStatus::Todo),
            "IN_PROGRESS" => Ok(TaskStatus::InProgress),
            "DONE" => Ok(TaskStatus::Done),
            other => Err(ParseTaskStatusError(other.to_string())),
        }
    }
}

/// Task record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Short title
    pub title: String,

    /// Optional longer description
    pub description: Option<String>,

    /// Current status
    pub status: TaskStatus,

    /// Optional due date
    pub deadline: Option<NaiveDate>,

    /// Owning project
    pub project_id: Uuid,

    /// Assigned user, if any
    pub assignee_id: Option<Uuid>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last changed
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task
#[derive(Debug, Clone)]
pub struct CreateTask {
    /// Title
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Initial status
    pub status: TaskStatus,

    /// Optional due date
    pub deadline: Option<NaiveDate>,

    /// Owning project
    pub project_id: Uuid,

    /// Optional assignee
    pub assignee_id: Option<Uuid>,
}

impl Task {
    /// Creates a task under an existing project
    ///
    /// Returns `None` if the project does not exist. The existence check is
    /// part of the insert statement, and the foreign key rejects a project
    /// deleted concurrently.
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (title, description, status, deadline, project_id, assignee_id)
            SELECT $1, $2, $3, $4, p.id, $6
            FROM projects p
            WHERE p.id = $5
            RETURNING id, title, description, status, deadline, project_id, assignee_id,
                      created_at, updated_at
            "#,
        )
        .bind(data.title)
        .bind(data.description)
        .bind(data.status)
        .bind(data.deadline)
        .bind(data.project_id)
        .bind(data.assignee_id)
        .fetch_optional(pool)
        .await
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, status, deadline, project_id, assignee_id,
                   created_at, updated_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Sets the status of a task, with no transition restriction
    ///
    /// Returns `None` if the task does not exist.
    pub async fn update_status(
        pool: &PgPool,
        id: Uuid,
        status: TaskStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, description, status, deadline, project_id, assignee_id,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(pool)
        .await
    }

    /// Moves a task to the next status in the cycle
    ///
    /// The successor is computed in SQL so two concurrent clicks advance the
    /// task twice instead of both writing the same value.
    pub async fn advance_status(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET status = CASE status
                    WHEN 'TODO' THEN 'IN_PROGRESS'::task_status
                    WHEN 'IN_PROGRESS' THEN 'DONE'::task_status
                    ELSE 'TODO'::task_status
                END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, description, status, deadline, project_id, assignee_id,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Deletes a task; returns false if it did not exist
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists the tasks of several projects, oldest first
    pub async fn list_by_projects(
        pool: &PgPool,
        project_ids: &[Uuid],
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, status, deadline, project_id, assignee_id,
                   created_at, updated_at
            FROM tasks
            WHERE project_id = ANY($1)
            ORDER BY created_at ASC
            "#,
        )
        .bind(project_ids)
        .fetch_all(pool)
        .await
    }
}
