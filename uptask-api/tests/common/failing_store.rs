//! Store wrapper whose cascade transaction fails part-way through
//!
//! Every read and write goes straight to the wrapped [`MemoryStore`]. Inside
//! a transaction, `delete_project` stages the deletion and then reports a
//! backend error, so the cascade has to discard everything it staged.

use async_trait::async_trait;
use uptask_shared::models::note::{CreateNote, Note};
use uptask_shared::models::project::{CreateProject, Project, UpdateProject};
use uptask_shared::models::task::{CreateTask, StatusChange, Task, TaskStatus, UpdateTask};
use uptask_shared::models::user::{CreateUser, User, UserSummary};
use uptask_shared::store::{MemoryStore, Store, StoreError, StoreResult, StoreTx};
use uuid::Uuid;

pub struct FailingCascadeStore {
    inner: MemoryStore,
}

impl FailingCascadeStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Store for FailingCascadeStore {
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        self.inner.find_user(id).await
    }
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.inner.find_user_by_email(email).await
    }
    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        self.inner.create_user(data).await
    }
    async fn create_project(&self, data: CreateProject) -> StoreResult<Project> {
        self.inner.create_project(data).await
    }
    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        self.inner.find_project(id).await
    }
    async fn list_projects_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Project>> {
        self.inner.list_projects_for_user(user_id).await
    }
    async fn update_project(&self, id: Uuid, data: UpdateProject) -> StoreResult<Option<Project>> {
        self.inner.update_project(id, data).await
    }
    async fn list_team(&self, project_id: Uuid) -> StoreResult<Vec<UserSummary>> {
        self.inner.list_team(project_id).await
    }
    async fn add_team_member(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        self.inner.add_team_member(project_id, user_id).await
    }
    async fn remove_team_member(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        self.inner.remove_team_member(project_id, user_id).await
    }
    async fn create_task(&self, data: CreateTask) -> StoreResult<Task> {
        self.inner.create_task(data).await
    }
    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        self.inner.find_task(id).await
    }
    async fn list_tasks(&self, project_id: Uuid) -> StoreResult<Vec<Task>> {
        self.inner.list_tasks(project_id).await
    }
    async fn update_task(&self, id: Uuid, data: UpdateTask) -> StoreResult<Option<Task>> {
        self.inner.update_task(id, data).await
    }
    async fn update_task_status(
        &self,
        id: Uuid,
        status: TaskStatus,
        changed_by: Uuid,
    ) -> StoreResult<Option<Task>> {
        self.inner.update_task_status(id, status, changed_by).await
    }
    async fn status_history(&self, task_id: Uuid) -> StoreResult<Vec<StatusChange>> {
        self.inner.status_history(task_id).await
    }
    async fn create_note(&self, data: CreateNote) -> StoreResult<Note> {
        self.inner.create_note(data).await
    }
    async fn find_note(&self, id: Uuid) -> StoreResult<Option<Note>> {
        self.inner.find_note(id).await
    }
    async fn list_notes(&self, task_id: Uuid) -> StoreResult<Vec<Note>> {
        self.inner.list_notes(task_id).await
    }
    async fn delete_note(&self, id: Uuid) -> StoreResult<bool> {
        self.inner.delete_note(id).await
    }
    async fn health_check(&self) -> StoreResult<()> {
        self.inner.health_check().await
    }
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
        Ok(Box::new(FailingTx {
            inner: self.inner.begin().await?,
        }))
    }
}

struct FailingTx {
    inner: Box<dyn StoreTx>,
}

#[async_trait]
impl StoreTx for FailingTx {
    async fn task_ids_for_project(&mut self, project_id: Uuid) -> StoreResult<Vec<Uuid>> {
        self.inner.task_ids_for_project(project_id).await
    }

    async fn delete_notes_for_tasks(&mut self, task_ids: &[Uuid]) -> StoreResult<u64> {
        self.inner.delete_notes_for_tasks(task_ids).await
    }

    async fn delete_tasks_for_project(&mut self, project_id: Uuid) -> StoreResult<u64> {
        self.inner.delete_tasks_for_project(project_id).await
    }

    async fn delete_task(&mut self, task_id: Uuid) -> StoreResult<bool> {
        self.inner.delete_task(task_id).await
    }

    async fn delete_project(&mut self, project_id: Uuid) -> StoreResult<bool> {
        self.inner.delete_project(project_id).await?;
        Err(StoreError::Backend("connection reset during delete".to_string()))
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.inner.commit().await
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        self.inner.rollback().await
    }
}
