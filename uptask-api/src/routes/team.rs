/// Team management endpoints
///
/// # Endpoints
///
/// - `POST /api/projects/:projectId/team/find` - Look up a user by email (manager)
/// - `GET /api/projects/:projectId/team` - List team members
/// - `POST /api/projects/:projectId/team` - Add a member (manager)
/// - `DELETE /api/projects/:projectId/team/:userId` - Remove a member (manager)
///
/// The manager is never part of the team list and cannot be added to it.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::resource::{ManagedProject, PathIds, ProjectAccess},
    routes::MessageResponse,
    validation::{parse_id, valid_id, ValidatedJson},
};
use axum::{extract::State, Json};
use serde::Deserialize;
use uptask_shared::models::user::UserSummary;
use validator::Validate;

/// Find member request
#[derive(Debug, Deserialize, Validate)]
pub struct FindMemberRequest {
    #[serde(default, deserialize_with = "crate::validation::lenient_string")]
    #[validate(email(message = "Email no válido"))]
    pub email: String,
}

/// Add member request
#[derive(Debug, Deserialize, Validate)]
pub struct AddMemberRequest {
    #[serde(default, deserialize_with = "crate::validation::lenient_string")]
    #[validate(custom(function = "valid_id", message = "ID no válido"))]
    pub id: String,
}

/// Look up a user by email
///
/// The address is lower-cased before the lookup.
///
/// # Errors
///
/// - `404 Not Found`: no user with that email
pub async fn find_member_by_email(
    State(state): State<AppState>,
    ManagedProject { .. }: ManagedProject,
    ValidatedJson(req): ValidatedJson<FindMemberRequest>,
) -> ApiResult<Json<UserSummary>> {
    let email = req.email.trim().to_lowercase();

    let user = state
        .store
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::NotFound("Usuario no encontrado".to_string()))?;

    Ok(Json(user.summary()))
}

/// List team members
pub async fn list_team(
    State(state): State<AppState>,
    ProjectAccess { project, .. }: ProjectAccess,
) -> ApiResult<Json<Vec<UserSummary>>> {
    let team = state.store.list_team(project.id).await?;
    Ok(Json(team))
}

/// Add a user to the team
///
/// # Request
///
/// ```json
/// { "id": "3f0c..." }
/// ```
///
/// # Errors
///
/// - `404 Not Found`: unknown user
/// - `409 Conflict`: user is the manager or already a member
pub async fn add_member(
    State(state): State<AppState>,
    ManagedProject { project, user }: ManagedProject,
    ValidatedJson(req): ValidatedJson<AddMemberRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let member_id = parse_id("id", req.id.trim())?;

    let member = state
        .store
        .find_user(member_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Usuario no encontrado".to_string()))?;

    let already_member = || ApiError::Conflict("El usuario ya existe en el proyecto".to_string());

    if project.is_member(member.id) {
        return Err(already_member());
    }

    if !state.store.add_team_member(project.id, member.id).await? {
        return Err(already_member());
    }

    tracing::info!(project_id = %project.id, member_id = %member.id, added_by = %user.id, "Team member added");

    Ok(Json(MessageResponse::new("Usuario agregado correctamente")))
}

/// Remove a user from the team
///
/// # Errors
///
/// - `409 Conflict`: user is not on the team
pub async fn remove_member(
    State(state): State<AppState>,
    ManagedProject { project, user }: ManagedProject,
    ids: PathIds,
) -> ApiResult<Json<MessageResponse>> {
    let member_id = ids.get("userId")?;

    let not_member = || ApiError::Conflict("El usuario no existe en el proyecto".to_string());

    if !project.team.contains(&member_id) {
        return Err(not_member());
    }

    if !state.store.remove_team_member(project.id, member_id).await? {
        return Err(not_member());
    }

    tracing::info!(project_id = %project.id, member_id = %member_id, removed_by = %user.id, "Team member removed");

    Ok(Json(MessageResponse::new("Usuario eliminado del proyecto")))
}
