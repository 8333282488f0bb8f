//! PostgreSQL-backed store
//!
//! Thin delegation onto the model functions in [`crate::models`].

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{Store, StoreError, StoreResult, StoreTx};
use crate::db::pool;
use crate::models::note::{CreateNote, Note};
use crate::models::project::{CreateProject, Project, UpdateProject};
use crate::models::task::{CreateTask, StatusChange, Task, TaskStatus, UpdateTask};
use crate::models::team::ProjectMember;
use crate::models::user::{CreateUser, User, UserSummary};

/// Store over a sqlx connection pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        User::create(&self.pool, data)
            .await
            .map_err(StoreError::from_sqlx)
    }

    async fn create_project(&self, data: CreateProject) -> StoreResult<Project> {
        Ok(Project::create(&self.pool, data).await?)
    }

    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        Ok(Project::find_by_id(&self.pool, id).await?)
    }

    async fn list_projects_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Project>> {
        Ok(Project::list_for_user(&self.pool, user_id).await?)
    }

    async fn update_project(&self, id: Uuid, data: UpdateProject) -> StoreResult<Option<Project>> {
        Ok(Project::update(&self.pool, id, data).await?)
    }

    async fn list_team(&self, project_id: Uuid) -> StoreResult<Vec<UserSummary>> {
        Ok(ProjectMember::list_team(&self.pool, project_id).await?)
    }

    async fn add_team_member(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        Ok(ProjectMember::add(&self.pool, project_id, user_id).await?)
    }

    async fn remove_team_member(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        Ok(ProjectMember::remove(&self.pool, project_id, user_id).await?)
    }

    async fn create_task(&self, data: CreateTask) -> StoreResult<Task> {
        Ok(Task::create(&self.pool, data).await?)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(Task::find_by_id(&self.pool, id).await?)
    }

    async fn list_tasks(&self, project_id: Uuid) -> StoreResult<Vec<Task>> {
        Ok(Task::list_by_project(&self.pool, project_id).await?)
    }

    async fn update_task(&self, id: Uuid, data: UpdateTask) -> StoreResult<Option<Task>> {
        Ok(Task::update(&self.pool, id, data).await?)
    }

    async fn update_task_status(
        &self,
        id: Uuid,
        status: TaskStatus,
        changed_by: Uuid,
    ) -> StoreResult<Option<Task>> {
        Ok(Task::update_status(&self.pool, id, status, changed_by).await?)
    }

    async fn status_history(&self, task_id: Uuid) -> StoreResult<Vec<StatusChange>> {
        Ok(Task::status_history(&self.pool, task_id).await?)
    }

    async fn create_note(&self, data: CreateNote) -> StoreResult<Note> {
        Ok(Note::create(&self.pool, data).await?)
    }

    async fn find_note(&self, id: Uuid) -> StoreResult<Option<Note>> {
        Ok(Note::find_by_id(&self.pool, id).await?)
    }

    async fn list_notes(&self, task_id: Uuid) -> StoreResult<Vec<Note>> {
        Ok(Note::list_by_task(&self.pool, task_id).await?)
    }

    async fn delete_note(&self, id: Uuid) -> StoreResult<bool> {
        Ok(Note::delete(&self.pool, id).await?)
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(pool::health_check(&self.pool).await?)
    }

    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgStoreTx { tx }))
    }
}

/// Transaction on a pooled connection
///
/// Dropped without commit, sqlx rolls it back when the connection returns
/// to the pool.
pub struct PgStoreTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgStoreTx {
    async fn task_ids_for_project(&mut self, project_id: Uuid) -> StoreResult<Vec<Uuid>> {
        Ok(Task::ids_for_project(&mut *self.tx, project_id).await?)
    }

    async fn delete_notes_for_tasks(&mut self, task_ids: &[Uuid]) -> StoreResult<u64> {
        Ok(Note::delete_for_tasks(&mut *self.tx, task_ids).await?)
    }

    async fn delete_tasks_for_project(&mut self, project_id: Uuid) -> StoreResult<u64> {
        Ok(Task::delete_for_project(&mut *self.tx, project_id).await?)
    }

    async fn delete_task(&mut self, task_id: Uuid) -> StoreResult<bool> {
        Ok(Task::delete(&mut *self.tx, task_id).await?)
    }

    async fn delete_project(&mut self, project_id: Uuid) -> StoreResult<bool> {
        Ok(Project::delete(&mut *self.tx, project_id).await?)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        Ok(self.tx.commit().await?)
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        Ok(self.tx.rollback().await?)
    }
}
