/// Project endpoints
///
/// # Endpoints
///
/// - `POST /api/projects` - Create a project (caller becomes manager)
/// - `GET /api/projects` - Projects the caller manages or belongs to
/// - `GET /api/projects/:projectId` - Project with its tasks
/// - `PUT /api/projects/:projectId` - Update a project (manager)
/// - `DELETE /api/projects/:projectId` - Delete a project, its tasks and their notes (manager)

use crate::{
    app::AppState,
    error::ApiResult,
    middleware::resource::{ManagedProject, ProjectAccess},
    routes::{tasks::TaskResponse, MessageResponse},
    validation::{not_blank, ValidatedJson},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uptask_shared::{
    auth::middleware::AuthUser,
    cascade,
    models::project::{CreateProject, Project, UpdateProject},
};
use uuid::Uuid;
use validator::Validate;

/// Create/update project request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRequest {
    #[serde(default, deserialize_with = "crate::validation::lenient_string")]
    #[validate(custom(function = "not_blank", message = "El Nombre del Proyecto es Obligatorio"))]
    pub project_name: String,

    #[serde(default, deserialize_with = "crate::validation::lenient_string")]
    #[validate(custom(function = "not_blank", message = "El Nombre del Cliente es Obligatorio"))]
    pub client_name: String,

    #[serde(default, deserialize_with = "crate::validation::lenient_string")]
    #[validate(custom(function = "not_blank", message = "La Descripción del Proyecto es Obligatorio"))]
    pub description: String,
}

/// Project as returned to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    pub id: Uuid,
    pub project_name: String,
    pub client_name: String,
    pub description: String,

    /// Manager's user ID
    pub manager: Uuid,

    /// Team member IDs
    pub team: Vec<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Project> for ProjectResponse {
    fn from(project: Project) -> Self {
        Self {
            id: project.id,
            project_name: project.project_name,
            client_name: project.client_name,
            description: project.description,
            manager: project.manager_id,
            team: project.team,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

/// Project with its tasks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDetailResponse {
    #[serde(flatten)]
    pub project: ProjectResponse,

    pub tasks: Vec<TaskResponse>,
}

/// Create project
///
/// # Request
///
/// ```json
/// { "projectName": "Tienda", "clientName": "Acme", "description": "Sitio web" }
/// ```
///
/// # Errors
///
/// - `422 Unprocessable Entity`: a field is missing or blank
pub async fn create_project(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(req): ValidatedJson<ProjectRequest>,
) -> ApiResult<(StatusCode, Json<ProjectResponse>)> {
    let project = state
        .store
        .create_project(CreateProject {
            project_name: req.project_name,
            client_name: req.client_name,
            description: req.description,
            manager_id: user.id,
        })
        .await?;

    tracing::info!(project_id = %project.id, manager_id = %user.id, "Project created");

    Ok((StatusCode::CREATED, Json(project.into())))
}

/// List the caller's projects
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<Vec<ProjectResponse>>> {
    let projects = state.store.list_projects_for_user(user.id).await?;

    Ok(Json(projects.into_iter().map(Into::into).collect()))
}

/// Get a project and its tasks
///
/// # Errors
///
/// - `403 Forbidden`: caller is neither manager nor team member
/// - `404 Not Found`: no such project
pub async fn get_project(
    State(state): State<AppState>,
    ProjectAccess { project, .. }: ProjectAccess,
) -> ApiResult<Json<ProjectDetailResponse>> {
    let tasks = state.store.list_tasks(project.id).await?;

    Ok(Json(ProjectDetailResponse {
        project: project.into(),
        tasks: tasks.into_iter().map(Into::into).collect(),
    }))
}

/// Update a project
///
/// # Errors
///
/// - `403 Forbidden`: caller is not the manager
/// - `422 Unprocessable Entity`: a field is missing or blank
pub async fn update_project(
    State(state): State<AppState>,
    ManagedProject { project, .. }: ManagedProject,
    ValidatedJson(req): ValidatedJson<ProjectRequest>,
) -> ApiResult<Json<ProjectResponse>> {
    let updated = state
        .store
        .update_project(
            project.id,
            UpdateProject {
                project_name: req.project_name,
                client_name: req.client_name,
                description: req.description,
            },
        )
        .await?
        .ok_or_else(|| crate::error::ApiError::NotFound("Proyecto no encontrado".to_string()))?;

    Ok(Json(updated.into()))
}

/// Delete a project with its tasks and their notes
///
/// All rows go in one transaction; on failure nothing is deleted and the
/// client receives a generic 500.
pub async fn delete_project(
    State(state): State<AppState>,
    ManagedProject { project, user }: ManagedProject,
) -> ApiResult<Json<MessageResponse>> {
    let summary = cascade::delete_project(state.store.as_ref(), project.id).await?;

    tracing::info!(
        project_id = %project.id,
        user_id = %user.id,
        tasks_deleted = summary.tasks_deleted,
        notes_deleted = summary.notes_deleted,
        "Project removed"
    );

    Ok(Json(MessageResponse::new("Proyecto Eliminado")))
}
