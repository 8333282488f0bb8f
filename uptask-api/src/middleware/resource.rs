/// Resource extractors
///
/// Handlers never look up the project or task named in their path
/// themselves. They declare one of these extractors instead, which run in
/// this order before the handler body:
///
/// 1. every path identifier is parsed (422 naming the parameter)
/// 2. the project is loaded (404 `Proyecto no encontrado`)
/// 3. the caller must be a member, or the manager (403 `Acción no válida`)
/// 4. the task is loaded (404 `Tarea no encontrada`)
/// 5. the task must belong to the project (404)
///
/// Callers without access to the project learn nothing about its tasks.
///
/// The loaded records are handed to the handler by value.
///
/// # Example
///
/// ```no_run
/// use axum::Json;
/// use uptask_api::middleware::resource::ManagedProject;
///
/// async fn rename(ManagedProject { project, .. }: ManagedProject) -> Json<String> {
///     Json(project.project_name)
/// }
/// ```

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use std::collections::HashMap;
use uptask_shared::auth::{
    authorization::{require_manager, require_member, require_task_in_project},
    middleware::AuthUser,
};
use uptask_shared::models::{project::Project, task::Task};
use uuid::Uuid;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    validation::INVALID_ID,
};

/// Every path parameter of the matched route, parsed as an identifier
#[derive(Debug, Clone, Default)]
pub struct PathIds(HashMap<String, Uuid>);

impl PathIds {
    /// Parses every value; all failures are reported together
    pub fn parse(params: HashMap<String, String>) -> ApiResult<Self> {
        let mut ids = HashMap::with_capacity(params.len());
        let mut invalid = Vec::new();

        for (name, value) in params {
            match Uuid::parse_str(&value) {
                Ok(id) => {
                    ids.insert(name, id);
                }
                Err(_) => invalid.push(ValidationErrorDetail::new(name, INVALID_ID)),
            }
        }

        if !invalid.is_empty() {
            invalid.sort_by(|a, b| a.field.cmp(&b.field));
            return Err(ApiError::ValidationError(invalid));
        }

        Ok(Self(ids))
    }

    pub fn get(&self, name: &str) -> ApiResult<Uuid> {
        self.0
            .get(name)
            .copied()
            .ok_or_else(|| ApiError::InternalError(format!("route has no `{name}` parameter")))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for PathIds
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

        PathIds::parse(params)
    }
}

/// Authenticated caller placed in the request by the JWT layer
pub fn current_user(parts: &Parts) -> ApiResult<AuthUser> {
    parts
        .extensions
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| ApiError::Unauthorized("No autorizado".to_string()))
}

async fn load_project(state: &AppState, project_id: Uuid) -> ApiResult<Project> {
    state
        .store
        .find_project(project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Proyecto no encontrado".to_string()))
}

async fn load_task(state: &AppState, project: &Project, task_id: Uuid) -> ApiResult<Task> {
    let task = state
        .store
        .find_task(task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Tarea no encontrada".to_string()))?;

    require_task_in_project(&task, project)?;
    Ok(task)
}

/// Project the caller manages or belongs to
#[derive(Debug, Clone)]
pub struct ProjectAccess {
    pub project: Project,
    pub user: AuthUser,
}

#[async_trait]
impl FromRequestParts<AppState> for ProjectAccess {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> ApiResult<Self> {
        let user = current_user(parts)?;
        let ids = PathIds::from_request_parts(parts, state).await?;

        let project = load_project(state, ids.get("projectId")?).await?;
        require_member(&project, user.id)?;

        Ok(Self { project, user })
    }
}

/// Project the caller manages
#[derive(Debug, Clone)]
pub struct ManagedProject {
    pub project: Project,
    pub user: AuthUser,
}

#[async_trait]
impl FromRequestParts<AppState> for ManagedProject {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> ApiResult<Self> {
        let user = current_user(parts)?;
        let ids = PathIds::from_request_parts(parts, state).await?;

        let project = load_project(state, ids.get("projectId")?).await?;
        require_manager(&project, user.id)?;

        Ok(Self { project, user })
    }
}

/// Task inside a project the caller belongs to
#[derive(Debug, Clone)]
pub struct TaskAccess {
    pub project: Project,
    pub task: Task,
    pub user: AuthUser,
}

#[async_trait]
impl FromRequestParts<AppState> for TaskAccess {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> ApiResult<Self> {
        let user = current_user(parts)?;
        let ids = PathIds::from_request_parts(parts, state).await?;

        let project = load_project(state, ids.get("projectId")?).await?;
        require_member(&project, user.id)?;
        let task = load_task(state, &project, ids.get("taskId")?).await?;

        Ok(Self { project, task, user })
    }
}

/// Task inside a project the caller manages
#[derive(Debug, Clone)]
pub struct ManagedTask {
    pub project: Project,
    pub task: Task,
    pub user: AuthUser,
}

#[async_trait]
impl FromRequestParts<AppState> for ManagedTask {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> ApiResult<Self> {
        let user = current_user(parts)?;
        let ids = PathIds::from_request_parts(parts, state).await?;

        let project = load_project(state, ids.get("projectId")?).await?;
        require_manager(&project, user.id)?;
        let task = load_task(state, &project, ids.get("taskId")?).await?;

        Ok(Self { project, task, user })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_path_ids_parse_all() {
        let project_id = Uuid::new_v4();
        let task_id = Uuid::new_v4();
        let (project_str, task_str) = (project_id.to_string(), task_id.to_string());

        let ids = PathIds::parse(params(&[
            ("projectId", project_str.as_str()),
            ("taskId", task_str.as_str()),
        ]))
        .unwrap();

        assert_eq!(ids.get("projectId").unwrap(), project_id);
        assert_eq!(ids.get("taskId").unwrap(), task_id);
        assert!(ids.get("noteId").is_err());
    }

    #[test]
    fn test_path_ids_report_every_invalid_parameter() {
        let note_str = Uuid::new_v4().to_string();
        let err = PathIds::parse(params(&[
            ("taskId", "abc"),
            ("projectId", "123"),
            ("noteId", note_str.as_str()),
        ]))
        .unwrap_err();

        match err {
            ApiError::ValidationError(details) => {
                let fields: Vec<_> = details.iter().map(|d| d.field.as_str()).collect();
                assert_eq!(fields, vec!["projectId", "taskId"]);
                assert!(details.iter().all(|d| d.message == INVALID_ID));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
