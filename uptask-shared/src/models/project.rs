/// Project model and database operations
///
/// A project is owned by its manager (the user who created it) and shared
/// with a team of users. Tasks reference their project; removing a project
/// goes through [`crate::cascade::delete_project`], which removes the tasks
/// and their notes in the same transaction.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_name VARCHAR(255) NOT NULL,
///     client_name VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL,
///     manager_id UUID NOT NULL REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// The `team` field is not a column: it is aggregated from `project_members`
/// (see [`super::team`]) in insertion order.
///
/// # Example
///
/// ```no_run
/// use uptask_shared::models::project::{Project, CreateProject};
/// use uptask_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example(manager_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let project = Project::create(&pool, CreateProject {
///     project_name: "Tienda Virtual".to_string(),
///     client_name: "Acme".to_string(),
///     description: "Rediseño del sitio".to_string(),
///     manager_id,
/// }).await?;
///
/// assert!(project.is_manager(manager_id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

/// Project record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    /// Unique project ID
    pub id: Uuid,

    /// Project name
    pub project_name: String,

    /// Client the project is for
    pub client_name: String,

    /// Free-form description
    pub description: String,

    /// User who manages the project
    pub manager_id: Uuid,

    /// Team members, in the order they were added
    pub team: Vec<Uuid>,

    /// When the project was created
    pub created_at: DateTime<Utc>,

    /// When the project was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProject {
    pub project_name: String,
    pub client_name: String,
    pub description: String,

    /// Creating user; becomes the manager
    pub manager_id: Uuid,
}

/// Input for updating a project
///
/// All three descriptive fields are replaced together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProject {
    pub project_name: String,
    pub client_name: String,
    pub description: String,
}

impl Project {
    /// Checks whether `user_id` manages this project
    pub fn is_manager(&self, user_id: Uuid) -> bool {
        self.manager_id == user_id
    }

    /// Checks whether `user_id` is on the project (manager or team member)
    pub fn is_member(&self, user_id: Uuid) -> bool {
        self.is_manager(user_id) || self.team.contains(&user_id)
    }

    /// Creates a new project with an empty team
    pub async fn create(pool: &PgPool, data: CreateProject) -> Result<Self, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (project_name, client_name, description, manager_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, project_name, client_name, description, manager_id,
                      ARRAY[]::UUID[] AS team, created_at, updated_at
            "#,
        )
        .bind(data.project_name.trim())
        .bind(data.client_name.trim())
        .bind(data.description.trim())
        .bind(data.manager_id)
        .fetch_one(pool)
        .await?;

        Ok(project)
    }

    /// Finds a project by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            SELECT p.id, p.project_name, p.client_name, p.description, p.manager_id,
                   ARRAY(
                       SELECT m.user_id FROM project_members m
                       WHERE m.project_id = p.id
                       ORDER BY m.added_at
                   ) AS team,
                   p.created_at, p.updated_at
            FROM projects p
            WHERE p.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }

    /// Lists the projects a user manages or belongs to, oldest first
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT p.id, p.project_name, p.client_name, p.description, p.manager_id,
                   ARRAY(
                       SELECT m.user_id FROM project_members m
                       WHERE m.project_id = p.id
                       ORDER BY m.added_at
                   ) AS team,
                   p.created_at, p.updated_at
            FROM projects p
            WHERE p.manager_id = $1
               OR EXISTS (
                   SELECT 1 FROM project_members m
                   WHERE m.project_id = p.id AND m.user_id = $1
               )
            ORDER BY p.created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(projects)
    }

    /// Replaces the descriptive fields of a project
    ///
    /// Returns `None` if the project does not exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProject,
    ) -> Result<Option<Self>, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET project_name = $2,
                client_name = $3,
                description = $4,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, project_name, client_name, description, manager_id,
                      ARRAY(
                          SELECT m.user_id FROM project_members m
                          WHERE m.project_id = projects.id
                          ORDER BY m.added_at
                      ) AS team,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.project_name.trim())
        .bind(data.client_name.trim())
        .bind(data.description.trim())
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }

    /// Deletes the project row inside an open transaction
    ///
    /// Callers must have removed the project's tasks (and their notes) first;
    /// team rows go with the project via `ON DELETE CASCADE`.
    pub async fn delete(conn: &mut PgConnection, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
