//! In-process store
//!
//! Keeps every collection behind one async mutex. A transaction takes the
//! lock for its whole lifetime and works on a staged copy, so concurrent
//! transactions are serialised and a rollback simply drops the copy.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{Store, StoreError, StoreResult, StoreTx};
use crate::models::note::{CreateNote, Note};
use crate::models::project::{CreateProject, Project, UpdateProject};
use crate::models::task::{CreateTask, StatusChange, Task, TaskStatus, UpdateTask};
use crate::models::user::{CreateUser, User, UserSummary};

#[derive(Debug, Clone, Default)]
struct Collections {
    users: Vec<User>,
    projects: Vec<Project>,
    tasks: Vec<Task>,
    status_changes: Vec<StatusChange>,
    notes: Vec<Note>,
}

impl Collections {
    fn delete_tasks_where(&mut self, matches: impl Fn(&Task) -> bool) -> u64 {
        let doomed: Vec<Uuid> = self
            .tasks
            .iter()
            .filter(|task| matches(task))
            .map(|task| task.id)
            .collect();

        self.tasks.retain(|task| !doomed.contains(&task.id));
        self.status_changes
            .retain(|change| !doomed.contains(&change.task_id));

        doomed.len() as u64
    }
}

/// Store that lives in process memory
///
/// Cloning shares the underlying data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Collections>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let data = self.inner.lock().await;
        Ok(data.users.iter().find(|user| user.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let data = self.inner.lock().await;
        Ok(data
            .users
            .iter()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        let mut collections = self.inner.lock().await;

        if collections
            .users
            .iter()
            .any(|user| user.email.eq_ignore_ascii_case(&data.email))
        {
            return Err(StoreError::Duplicate("users_email_key".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: data.email,
            name: data.name,
            password_hash: data.password_hash,
            confirmed: false,
            created_at: now,
            updated_at: now,
        };
        collections.users.push(user.clone());

        Ok(user)
    }

    async fn create_project(&self, data: CreateProject) -> StoreResult<Project> {
        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4(),
            project_name: data.project_name.trim().to_string(),
            client_name: data.client_name.trim().to_string(),
            description: data.description.trim().to_string(),
            manager_id: data.manager_id,
            team: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        self.inner.lock().await.projects.push(project.clone());
        Ok(project)
    }

    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        let data = self.inner.lock().await;
        Ok(data.projects.iter().find(|p| p.id == id).cloned())
    }

    async fn list_projects_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Project>> {
        let data = self.inner.lock().await;
        Ok(data
            .projects
            .iter()
            .filter(|p| p.is_member(user_id))
            .cloned()
            .collect())
    }

    async fn update_project(&self, id: Uuid, data: UpdateProject) -> StoreResult<Option<Project>> {
        let mut collections = self.inner.lock().await;
        let Some(project) = collections.projects.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };

        project.project_name = data.project_name.trim().to_string();
        project.client_name = data.client_name.trim().to_string();
        project.description = data.description.trim().to_string();
        project.updated_at = Utc::now();

        Ok(Some(project.clone()))
    }

    async fn list_team(&self, project_id: Uuid) -> StoreResult<Vec<UserSummary>> {
        let data = self.inner.lock().await;
        let Some(project) = data.projects.iter().find(|p| p.id == project_id) else {
            return Ok(Vec::new());
        };

        Ok(project
            .team
            .iter()
            .filter_map(|member| data.users.iter().find(|user| user.id == *member))
            .map(User::summary)
            .collect())
    }

    async fn add_team_member(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let mut data = self.inner.lock().await;
        let Some(project) = data.projects.iter_mut().find(|p| p.id == project_id) else {
            return Ok(false);
        };

        if project.team.contains(&user_id) {
            return Ok(false);
        }
        project.team.push(user_id);
        Ok(true)
    }

    async fn remove_team_member(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let mut data = self.inner.lock().await;
        let Some(project) = data.projects.iter_mut().find(|p| p.id == project_id) else {
            return Ok(false);
        };

        let before = project.team.len();
        project.team.retain(|member| *member != user_id);
        Ok(project.team.len() != before)
    }

    async fn create_task(&self, data: CreateTask) -> StoreResult<Task> {
        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            project_id: data.project_id,
            name: data.name.trim().to_string(),
            description: data.description.trim().to_string(),
            status: TaskStatus::default(),
            created_at: now,
            updated_at: now,
        };

        self.inner.lock().await.tasks.push(task.clone());
        Ok(task)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        let data = self.inner.lock().await;
        Ok(data.tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn list_tasks(&self, project_id: Uuid) -> StoreResult<Vec<Task>> {
        let data = self.inner.lock().await;
        Ok(data
            .tasks
            .iter()
            .filter(|t| t.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn update_task(&self, id: Uuid, data: UpdateTask) -> StoreResult<Option<Task>> {
        let mut collections = self.inner.lock().await;
        let Some(task) = collections.tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };

        task.name = data.name.trim().to_string();
        task.description = data.description.trim().to_string();
        task.updated_at = Utc::now();

        Ok(Some(task.clone()))
    }

    async fn update_task_status(
        &self,
        id: Uuid,
        status: TaskStatus,
        changed_by: Uuid,
    ) -> StoreResult<Option<Task>> {
        let mut data = self.inner.lock().await;
        let now = Utc::now();

        let Some(task) = data.tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        let previous = task.status;
        task.status = status;
        task.updated_at = now;
        let updated = task.clone();

        data.status_changes.push(StatusChange {
            id: Uuid::new_v4(),
            task_id: id,
            user_id: changed_by,
            previous_status: Some(previous),
            status,
            changed_at: now,
        });

        Ok(Some(updated))
    }

    async fn status_history(&self, task_id: Uuid) -> StoreResult<Vec<StatusChange>> {
        let data = self.inner.lock().await;
        Ok(data
            .status_changes
            .iter()
            .filter(|c| c.task_id == task_id)
            .cloned()
            .collect())
    }

    async fn create_note(&self, data: CreateNote) -> StoreResult<Note> {
        let now = Utc::now();
        let note = Note {
            id: Uuid::new_v4(),
            content: data.content.trim().to_string(),
            task_id: data.task_id,
            created_by: data.created_by,
            created_at: now,
            updated_at: now,
        };

        self.inner.lock().await.notes.push(note.clone());
        Ok(note)
    }

    async fn find_note(&self, id: Uuid) -> StoreResult<Option<Note>> {
        let data = self.inner.lock().await;
        Ok(data.notes.iter().find(|n| n.id == id).cloned())
    }

    async fn list_notes(&self, task_id: Uuid) -> StoreResult<Vec<Note>> {
        let data = self.inner.lock().await;
        Ok(data
            .notes
            .iter()
            .filter(|n| n.task_id == task_id)
            .cloned()
            .collect())
    }

    async fn delete_note(&self, id: Uuid) -> StoreResult<bool> {
        let mut data = self.inner.lock().await;
        let before = data.notes.len();
        data.notes.retain(|n| n.id != id);
        Ok(data.notes.len() != before)
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
        let guard = Arc::clone(&self.inner).lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryStoreTx { guard, staged }))
    }
}

/// Transaction over a [`MemoryStore`]
pub struct MemoryStoreTx {
    guard: OwnedMutexGuard<Collections>,
    staged: Collections,
}

#[async_trait]
impl StoreTx for MemoryStoreTx {
    async fn task_ids_for_project(&mut self, project_id: Uuid) -> StoreResult<Vec<Uuid>> {
        Ok(self
            .staged
            .tasks
            .iter()
            .filter(|t| t.project_id == project_id)
            .map(|t| t.id)
            .collect())
    }

    async fn delete_notes_for_tasks(&mut self, task_ids: &[Uuid]) -> StoreResult<u64> {
        let before = self.staged.notes.len();
        self.staged.notes.retain(|n| !task_ids.contains(&n.task_id));
        Ok((before - self.staged.notes.len()) as u64)
    }

    async fn delete_tasks_for_project(&mut self, project_id: Uuid) -> StoreResult<u64> {
        Ok(self
            .staged
            .delete_tasks_where(|task| task.project_id == project_id))
    }

    async fn delete_task(&mut self, task_id: Uuid) -> StoreResult<bool> {
        Ok(self.staged.delete_tasks_where(|task| task.id == task_id) > 0)
    }

    async fn delete_project(&mut self, project_id: Uuid) -> StoreResult<bool> {
        let before = self.staged.projects.len();
        self.staged.projects.retain(|p| p.id != project_id);
        Ok(self.staged.projects.len() != before)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryStoreTx { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed_user(store: &MemoryStore, email: &str) -> User {
        store
            .create_user(CreateUser {
                email: email.to_string(),
                name: "Ana".to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_email_lookup_is_case_insensitive() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "ana@example.com").await;

        let found = store.find_user_by_email("ANA@Example.com").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let store = MemoryStore::new();
        seed_user(&store, "ana@example.com").await;

        let err = store
            .create_user(CreateUser {
                email: "Ana@example.com".to_string(),
                name: "Otra".to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_team_membership_round() {
        let store = MemoryStore::new();
        let manager = seed_user(&store, "manager@example.com").await;
        let member = seed_user(&store, "member@example.com").await;

        let project = store
            .create_project(CreateProject {
                project_name: "  Tienda  ".to_string(),
                client_name: "Acme".to_string(),
                description: "Sitio".to_string(),
                manager_id: manager.id,
            })
            .await
            .unwrap();
        assert_eq!(project.project_name, "Tienda");

        assert!(store.add_team_member(project.id, member.id).await.unwrap());
        assert!(!store.add_team_member(project.id, member.id).await.unwrap());

        let team = store.list_team(project.id).await.unwrap();
        assert_eq!(team, vec![member.summary()]);

        let visible = store.list_projects_for_user(member.id).await.unwrap();
        assert_eq!(visible.len(), 1);

        assert!(store.remove_team_member(project.id, member.id).await.unwrap());
        assert!(!store.remove_team_member(project.id, member.id).await.unwrap());
        assert!(store.list_projects_for_user(member.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_status_update_appends_history() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "ana@example.com").await;
        let task = store
            .create_task(CreateTask {
                project_id: Uuid::new_v4(),
                name: "Portada".to_string(),
                description: "Maqueta".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(task.status, TaskStatus::Pending);

        store
            .update_task_status(task.id, TaskStatus::InProgress, user.id)
            .await
            .unwrap();
        store
            .update_task_status(task.id, TaskStatus::Completed, user.id)
            .await
            .unwrap();

        let history = store.status_history(task.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].previous_status, Some(TaskStatus::Pending));
        assert_eq!(history[1].previous_status, Some(TaskStatus::InProgress));
        assert_eq!(history[1].status, TaskStatus::Completed);
    }

    #[tokio::test]
    async fn test_rollback_discards_staged_writes() {
        let store = MemoryStore::new();
        let project_id = Uuid::new_v4();
        store
            .create_task(CreateTask {
                project_id,
                name: "Portada".to_string(),
                description: "Maqueta".to_string(),
            })
            .await
            .unwrap();

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.delete_tasks_for_project(project_id).await.unwrap(), 1);
        tx.rollback().await.unwrap();

        assert_eq!(store.list_tasks(project_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_dropped_transaction_discards_staged_writes() {
        let store = MemoryStore::new();
        let project_id = Uuid::new_v4();
        store
            .create_task(CreateTask {
                project_id,
                name: "Portada".to_string(),
                description: "Maqueta".to_string(),
            })
            .await
            .unwrap();

        {
            let mut tx = store.begin().await.unwrap();
            tx.delete_tasks_for_project(project_id).await.unwrap();
        }

        assert_eq!(store.list_tasks(project_id).await.unwrap().len(), 1);
    }
}
