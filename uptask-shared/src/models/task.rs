/// Task model and database operations
///
/// Tasks belong to exactly one project and move through a small workflow.
/// Every status change is appended to `task_status_changes`, so the task
/// carries a history of who moved it where and when.
///
/// # Workflow
///
/// ```text
/// pending ⇄ onHold ⇄ inProgress ⇄ underReview ⇄ completed
/// ```
///
/// Any status may be set from any other; the log records the previous value.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM (
///     'pending', 'onHold', 'inProgress', 'underReview', 'completed'
/// );
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id),
///     name VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL,
///     status task_status NOT NULL DEFAULT 'pending',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE task_status_changes (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id),
///     previous_status task_status,
///     status task_status NOT NULL,
///     changed_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use uptask_shared::models::task::{Task, CreateTask, TaskStatus};
/// use uptask_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example(project_id: Uuid, user_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let task = Task::create(&pool, CreateTask {
///     project_id,
///     name: "Diseñar portada".to_string(),
///     description: "Maqueta en Figma".to_string(),
/// }).await?;
///
/// Task::update_status(&pool, task.id, TaskStatus::InProgress, user_id).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Task workflow status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum TaskStatus {
    /// Not started yet
    #[default]
    Pending,

    /// Blocked or paused
    OnHold,

    /// Being worked on
    InProgress,

    /// Waiting for review
    UnderReview,

    /// Done
    Completed,
}

impl TaskStatus {
    /// All statuses in workflow order
    pub const ALL: [TaskStatus; 5] = [
        TaskStatus::Pending,
        TaskStatus::OnHold,
        TaskStatus::InProgress,
        TaskStatus::UnderReview,
        TaskStatus::Completed,
    ];

    /// Wire/database representation
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::OnHold => "onHold",
            TaskStatus::InProgress => "inProgress",
            TaskStatus::UnderReview => "underReview",
            TaskStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown task status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for TaskStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// Task record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Project this task belongs to
    pub project_id: Uuid,

    /// Task name
    pub name: String,

    /// Task description
    pub description: String,

    /// Current workflow status
    pub status: TaskStatus,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Status history entry
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StatusChange {
    pub id: Uuid,
    pub task_id: Uuid,

    /// User who changed the status
    pub user_id: Uuid,

    /// Status before the change (None only for imported rows)
    pub previous_status: Option<TaskStatus>,

    /// Status after the change
    pub status: TaskStatus,

    pub changed_at: DateTime<Utc>,
}

/// Input for creating a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub project_id: Uuid,
    pub name: String,
    pub description: String,
}

/// Input for updating a task's descriptive fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTask {
    pub name: String,
    pub description: String,
}

impl Task {
    /// Creates a new task in pending status
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (project_id, name, description)
            VALUES ($1, $2, $3)
            RETURNING id, project_id, name, description, status, created_at, updated_at
            "#,
        )
        .bind(data.project_id)
        .bind(data.name.trim())
        .bind(data.description.trim())
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, project_id, name, description, status, created_at, updated_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists a project's tasks, oldest first
    pub async fn list_by_project(pool: &PgPool, project_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, project_id, name, description, status, created_at, updated_at
            FROM tasks
            WHERE project_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Replaces a task's name and description
    pub async fn update(pool: &PgPool, id: Uuid, data: UpdateTask) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET name = $2,
                description = $3,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, project_id, name, description, status, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.name.trim())
        .bind(data.description.trim())
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Sets a task's status and appends the change to its history
    ///
    /// Both writes happen in one statement, so the log never disagrees with
    /// the task row.
    pub async fn update_status(
        pool: &PgPool,
        id: Uuid,
        status: TaskStatus,
        changed_by: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            WITH previous AS (
                SELECT id, status FROM tasks WHERE id = $1 FOR UPDATE
            ),
            updated AS (
                UPDATE tasks
                SET status = $2,
                    updated_at = NOW()
                FROM previous
                WHERE tasks.id = previous.id
                RETURNING tasks.id, tasks.project_id, tasks.name, tasks.description,
                          tasks.status, tasks.created_at, tasks.updated_at
            ),
            logged AS (
                INSERT INTO task_status_changes (task_id, user_id, previous_status, status)
                SELECT previous.id, $3, previous.status, $2
                FROM previous
            )
            SELECT id, project_id, name, description, status, created_at, updated_at
            FROM updated
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(changed_by)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Returns a task's status history, oldest first
    pub async fn status_history(pool: &PgPool, id: Uuid) -> Result<Vec<StatusChange>, sqlx::Error> {
        let changes = sqlx::query_as::<_, StatusChange>(
            r#"
            SELECT id, task_id, user_id, previous_status, status, changed_at
            FROM task_status_changes
            WHERE task_id = $1
            ORDER BY changed_at ASC
            "#,
        )
        .bind(id)
        .fetch_all(pool)
        .await?;

        Ok(changes)
    }

    /// Collects the IDs of a project's tasks inside an open transaction
    pub async fn ids_for_project(
        conn: &mut PgConnection,
        project_id: Uuid,
    ) -> Result<Vec<Uuid>, sqlx::Error> {
        let ids = sqlx::query_scalar::<_, Uuid>("SELECT id FROM tasks WHERE project_id = $1")
            .bind(project_id)
            .fetch_all(&mut *conn)
            .await?;

        Ok(ids)
    }

    /// Deletes every task of a project inside an open transaction
    ///
    /// Notes must already be gone (`notes.task_id` has no cascade); status
    /// history rows cascade.
    pub async fn delete_for_project(
        conn: &mut PgConnection,
        project_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE project_id = $1")
            .bind(project_id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected())
    }

    /// Deletes one task inside an open transaction
    pub async fn delete(conn: &mut PgConnection, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
