/// Task note endpoints
///
/// - `POST /api/projects/:projectId/tasks/:taskId/notes`
/// - `GET /api/projects/:projectId/tasks/:taskId/notes`
/// - `DELETE /api/projects/:projectId/tasks/:taskId/notes/:noteId` (author only)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::resource::{PathIds, TaskAccess},
    routes::MessageResponse,
    validation::{not_blank, ValidatedJson},
};
use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uptask_shared::{
    auth::authorization::{require_note_author, require_note_in_task},
    models::note::{CreateNote, Note},
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct NoteRequest {
    #[serde(default, deserialize_with = "crate::validation::lenient_string")]
    #[validate(custom(function = "not_blank", message = "El contenido de la nota es obligatorio"))]
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteResponse {
    pub id: Uuid,
    pub content: String,
    pub task: Uuid,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<Note> for NoteResponse {
    fn from(note: Note) -> Self {
        Self {
            id: note.id,
            content: note.content,
            task: note.task_id,
            created_by: note.created_by,
            created_at: note.created_at,
        }
    }
}

/// Create a note on a task; the caller becomes its author
pub async fn create_note(
    State(state): State<AppState>,
    TaskAccess { task, user, .. }: TaskAccess,
    ValidatedJson(req): ValidatedJson<NoteRequest>,
) -> ApiResult<(StatusCode, Json<NoteResponse>)> {
    let note = state
        .store
        .create_note(CreateNote {
            content: req.content,
            task_id: task.id,
            created_by: user.id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(note.into())))
}

pub async fn list_notes(
    State(state): State<AppState>,
    TaskAccess { task, .. }: TaskAccess,
) -> ApiResult<Json<Vec<NoteResponse>>> {
    let notes = state.store.list_notes(task.id).await?;
    Ok(Json(notes.into_iter().map(Into::into).collect()))
}

/// Delete a note
///
/// # Errors
///
/// - `404 Not Found`: no such note, or it belongs to another task
/// - `403 Forbidden`: caller did not write the note
pub async fn delete_note(
    State(state): State<AppState>,
    TaskAccess { task, user, .. }: TaskAccess,
    ids: PathIds,
) -> ApiResult<Json<MessageResponse>> {
    let note = state
        .store
        .find_note(ids.get("noteId")?)
        .await?
        .ok_or_else(|| ApiError::NotFound("Nota no encontrada".to_string()))?;

    require_note_in_task(&note, &task)?;
    require_note_author(&note, user.id)?;

    if !state.store.delete_note(note.id).await? {
        return Err(ApiError::NotFound("Nota no encontrada".to_string()));
    }

    tracing::debug!(note_id = %note.id, task_id = %task.id, "Note removed");

    Ok(Json(MessageResponse::new("Nota Eliminada")))
}
