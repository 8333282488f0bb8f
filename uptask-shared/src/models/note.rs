/// Note model and database operations
///
/// Notes are short comments left on a task by project members. A note
/// belongs to exactly one task and is removed together with it.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE notes (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     content TEXT NOT NULL,
///     task_id UUID NOT NULL REFERENCES tasks(id),
///     created_by UUID NOT NULL REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

/// Note attached to a task
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Note {
    pub id: Uuid,

    /// Note body
    pub content: String,

    /// Task the note is attached to
    pub task_id: Uuid,

    /// Author
    pub created_by: Uuid,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a note
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNote {
    pub content: String,
    pub task_id: Uuid,
    pub created_by: Uuid,
}

impl Note {
    /// Checks whether `user_id` wrote this note
    pub fn is_author(&self, user_id: Uuid) -> bool {
        self.created_by == user_id
    }

    /// Creates a note
    pub async fn create(pool: &PgPool, data: CreateNote) -> Result<Self, sqlx::Error> {
        let note = sqlx::query_as::<_, Note>(
            r#"
            INSERT INTO notes (content, task_id, created_by)
            VALUES ($1, $2, $3)
            RETURNING id, content, task_id, created_by, created_at, updated_at
            "#,
        )
        .bind(data.content.trim())
        .bind(data.task_id)
        .bind(data.created_by)
        .fetch_one(pool)
        .await?;

        Ok(note)
    }

    /// Finds a note by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let note = sqlx::query_as::<_, Note>(
            r#"
            SELECT id, content, task_id, created_by, created_at, updated_at
            FROM notes
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(note)
    }

    /// Lists a task's notes, oldest first
    pub async fn list_by_task(pool: &PgPool, task_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let notes = sqlx::query_as::<_, Note>(
            r#"
            SELECT id, content, task_id, created_by, created_at, updated_at
            FROM notes
            WHERE task_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await?;

        Ok(notes)
    }

    /// Deletes a single note
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes every note attached to any of `task_ids` inside an open
    /// transaction
    pub async fn delete_for_tasks(
        conn: &mut PgConnection,
        task_ids: &[Uuid],
    ) -> Result<u64, sqlx::Error> {
        if task_ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query("DELETE FROM notes WHERE task_id = ANY($1)")
            .bind(task_ids.to_vec())
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected())
    }
}
