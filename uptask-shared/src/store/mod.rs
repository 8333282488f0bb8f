//! Data-access layer
//!
//! Handlers talk to persistence through the [`Store`] trait so the same
//! router runs against PostgreSQL in production and against an in-process
//! store in tests and local demos. The concrete store is built once at
//! startup and handed to the router; nothing registers itself globally.
//!
//! Multi-entity deletions go through a [`StoreTx`] obtained from
//! [`Store::begin`]. A transaction must end with exactly one of
//! [`StoreTx::commit`] or [`StoreTx::rollback`]; dropping it without either
//! discards its writes.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::note::{CreateNote, Note};
use crate::models::project::{CreateProject, Project, UpdateProject};
use crate::models::task::{CreateTask, StatusChange, Task, TaskStatus, UpdateTask};
use crate::models::user::{CreateUser, User, UserSummary};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Store failure
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Underlying database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Unique key already taken
    #[error("duplicate value: {0}")]
    Duplicate(String),

    /// Non-database backend failure (also used for injected faults in tests)
    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Maps unique-constraint violations onto [`StoreError::Duplicate`]
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return StoreError::Duplicate(
                    db_err.constraint().unwrap_or("unique key").to_string(),
                );
            }
        }
        StoreError::Database(err)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Reads and single-statement writes
#[async_trait]
pub trait Store: Send + Sync {
    // Users

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Case-insensitive lookup
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Fails with [`StoreError::Duplicate`] when the email is taken
    async fn create_user(&self, data: CreateUser) -> StoreResult<User>;

    // Projects

    async fn create_project(&self, data: CreateProject) -> StoreResult<Project>;

    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>>;

    /// Projects the user manages or is a team member of, oldest first
    async fn list_projects_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Project>>;

    async fn update_project(&self, id: Uuid, data: UpdateProject) -> StoreResult<Option<Project>>;

    // Team

    /// Team members (manager excluded) in the order they were added
    async fn list_team(&self, project_id: Uuid) -> StoreResult<Vec<UserSummary>>;

    /// Returns `false` if the user was already on the team
    async fn add_team_member(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<bool>;

    /// Returns `false` if the user was not on the team
    async fn remove_team_member(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<bool>;

    // Tasks

    async fn create_task(&self, data: CreateTask) -> StoreResult<Task>;

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>>;

    async fn list_tasks(&self, project_id: Uuid) -> StoreResult<Vec<Task>>;

    async fn update_task(&self, id: Uuid, data: UpdateTask) -> StoreResult<Option<Task>>;

    /// Sets the status and appends a history entry atomically
    async fn update_task_status(
        &self,
        id: Uuid,
        status: TaskStatus,
        changed_by: Uuid,
    ) -> StoreResult<Option<Task>>;

    async fn status_history(&self, task_id: Uuid) -> StoreResult<Vec<StatusChange>>;

    // Notes

    async fn create_note(&self, data: CreateNote) -> StoreResult<Note>;

    async fn find_note(&self, id: Uuid) -> StoreResult<Option<Note>>;

    async fn list_notes(&self, task_id: Uuid) -> StoreResult<Vec<Note>>;

    async fn delete_note(&self, id: Uuid) -> StoreResult<bool>;

    // Lifecycle

    /// Checks that the backend is reachable
    async fn health_check(&self) -> StoreResult<()>;

    /// Opens a transaction for multi-entity deletes
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>>;
}

/// Open transaction
///
/// Writes are visible to other callers only after [`StoreTx::commit`].
#[async_trait]
pub trait StoreTx: Send {
    /// IDs of every task under `project_id`
    async fn task_ids_for_project(&mut self, project_id: Uuid) -> StoreResult<Vec<Uuid>>;

    /// Deletes notes attached to any of `task_ids`; returns how many
    async fn delete_notes_for_tasks(&mut self, task_ids: &[Uuid]) -> StoreResult<u64>;

    /// Deletes every task under `project_id` (and their status history)
    async fn delete_tasks_for_project(&mut self, project_id: Uuid) -> StoreResult<u64>;

    /// Deletes one task (and its status history)
    async fn delete_task(&mut self, task_id: Uuid) -> StoreResult<bool>;

    /// Deletes the project row and its team memberships
    async fn delete_project(&mut self, project_id: Uuid) -> StoreResult<bool>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;

    async fn rollback(self: Box<Self>) -> StoreResult<()>;
}
