/// Task endpoints
///
/// # Endpoints
///
/// - `POST /api/projects/:projectId/tasks` - Create a task (manager)
/// - `GET /api/projects/:projectId/tasks` - List a project's tasks
/// - `GET /api/projects/:projectId/tasks/:taskId` - Task with status history and notes
/// - `PUT /api/projects/:projectId/tasks/:taskId` - Update name and description (manager)
/// - `DELETE /api/projects/:projectId/tasks/:taskId` - Delete a task and its notes (manager)
/// - `POST /api/projects/:projectId/tasks/:taskId/status` - Change status (member)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::resource::{ManagedProject, ManagedTask, ProjectAccess, TaskAccess},
    routes::{notes::NoteResponse, MessageResponse},
    validation::{not_blank, ValidatedJson},
};
use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uptask_shared::{
    cascade,
    models::task::{CreateTask, StatusChange, Task, TaskStatus, UpdateTask},
};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Create/update task request
#[derive(Debug, Deserialize, Validate)]
pub struct TaskRequest {
    #[serde(default, deserialize_with = "crate::validation::lenient_string")]
    #[validate(custom(function = "not_blank", message = "El Nombre de la Tarea es Obligatorio"))]
    pub name: String,

    #[serde(default, deserialize_with = "crate::validation::lenient_string")]
    #[validate(custom(function = "not_blank", message = "La Descripción de la tarea es Obligatorio"))]
    pub description: String,
}

/// Status change request
#[derive(Debug, Deserialize, Validate)]
pub struct StatusRequest {
    #[serde(default, deserialize_with = "crate::validation::lenient_string")]
    #[validate(custom(function = "known_status"))]
    pub status: String,
}

const STATUS_REQUIRED: &str = "El estado es obligatorio";
const STATUS_UNKNOWN: &str = "Estado no válido";

fn known_status(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message(STATUS_REQUIRED.into()));
    }

    TaskStatus::from_str(value)
        .map(|_| ())
        .map_err(|_| ValidationError::new("unknown_status").with_message(STATUS_UNKNOWN.into()))
}

/// Task as returned to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub id: Uuid,

    /// Owning project ID
    pub project: Uuid,

    pub name: String,
    pub description: String,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            project: task.project_id,
            name: task.name,
            description: task.description,
            status: task.status,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

/// Status history entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangeResponse {
    pub user: Uuid,
    pub previous_status: Option<TaskStatus>,
    pub status: TaskStatus,
    pub changed_at: DateTime<Utc>,
}

impl From<StatusChange> for StatusChangeResponse {
    fn from(change: StatusChange) -> Self {
        Self {
            user: change.user_id,
            previous_status: change.previous_status,
            status: change.status,
            changed_at: change.changed_at,
        }
    }
}

/// Task with its history and notes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDetailResponse {
    #[serde(flatten)]
    pub task: TaskResponse,

    pub completed_by: Vec<StatusChangeResponse>,
    pub notes: Vec<NoteResponse>,
}

/// Create task
///
/// New tasks start as `pending`.
///
/// # Errors
///
/// - `403 Forbidden`: caller is not the manager
/// - `422 Unprocessable Entity`: name or description missing
pub async fn create_task(
    State(state): State<AppState>,
    ManagedProject { project, .. }: ManagedProject,
    ValidatedJson(req): ValidatedJson<TaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    let task = state
        .store
        .create_task(CreateTask {
            project_id: project.id,
            name: req.name,
            description: req.description,
        })
        .await?;

    tracing::info!(task_id = %task.id, project_id = %project.id, "Task created");

    Ok((StatusCode::CREATED, Json(task.into())))
}

/// List a project's tasks
pub async fn list_tasks(
    State(state): State<AppState>,
    ProjectAccess { project, .. }: ProjectAccess,
) -> ApiResult<Json<Vec<TaskResponse>>> {
    let tasks = state.store.list_tasks(project.id).await?;
    Ok(Json(tasks.into_iter().map(Into::into).collect()))
}

/// Get a task with its status history and notes
pub async fn get_task(
    State(state): State<AppState>,
    TaskAccess { task, .. }: TaskAccess,
) -> ApiResult<Json<TaskDetailResponse>> {
    let history = state.store.status_history(task.id).await?;
    let notes = state.store.list_notes(task.id).await?;

    Ok(Json(TaskDetailResponse {
        task: task.into(),
        completed_by: history.into_iter().map(Into::into).collect(),
        notes: notes.into_iter().map(Into::into).collect(),
    }))
}

/// Update a task's name and description
pub async fn update_task(
    State(state): State<AppState>,
    ManagedTask { task, .. }: ManagedTask,
    ValidatedJson(req): ValidatedJson<TaskRequest>,
) -> ApiResult<Json<TaskResponse>> {
    let updated = state
        .store
        .update_task(
            task.id,
            UpdateTask {
                name: req.name,
                description: req.description,
            },
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("Tarea no encontrada".to_string()))?;

    Ok(Json(updated.into()))
}

/// Delete a task and its notes in one transaction
pub async fn delete_task(
    State(state): State<AppState>,
    ManagedTask { task, user, .. }: ManagedTask,
) -> ApiResult<Json<MessageResponse>> {
    let summary = cascade::delete_task(state.store.as_ref(), task.id).await?;

    tracing::info!(
        task_id = %task.id,
        user_id = %user.id,
        notes_deleted = summary.notes_deleted,
        "Task removed"
    );

    Ok(Json(MessageResponse::new("Tarea Eliminada")))
}

/// Change a task's status
///
/// Any project member may move a task; every change is appended to the
/// task's history with the caller as author.
///
/// # Request
///
/// ```json
/// { "status": "inProgress" }
/// ```
pub async fn update_status(
    State(state): State<AppState>,
    TaskAccess { task, user, .. }: TaskAccess,
    ValidatedJson(req): ValidatedJson<StatusRequest>,
) -> ApiResult<Json<TaskResponse>> {
    let status = TaskStatus::from_str(&req.status)
        .map_err(|_| ApiError::invalid_field("status", STATUS_UNKNOWN))?;

    let updated = state
        .store
        .update_task_status(task.id, status, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Tarea no encontrada".to_string()))?;

    tracing::debug!(task_id = %task.id, from = %task.status, to = %status, "Task status changed");

    Ok(Json(updated.into()))
}
