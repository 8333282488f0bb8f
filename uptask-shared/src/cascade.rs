//! Transactional cascade deletes
//!
//! Tasks reference their project and notes reference their task, but the
//! schema does not cascade those references. Removing a project therefore
//! goes through [`delete_project`], which deletes the notes of every task in
//! the project, then the tasks, then the project row, all in one store
//! transaction. [`delete_task`] does the same for a single task.
//!
//! Either every deletion becomes visible or none does. Any failure rolls the
//! transaction back and is returned to the caller.

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::store::{Store, StoreError, StoreTx};

/// What a cascade removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CascadeSummary {
    pub tasks_deleted: u64,
    pub notes_deleted: u64,
    pub project_deleted: bool,
}

/// Deletes a project together with its tasks and their notes
///
/// A nil `project_id` is a no-op: the transaction is opened, rolled back and
/// an empty summary returned.
///
/// # Errors
///
/// Returns the first store error. The transaction has been rolled back by
/// the time the error is returned.
pub async fn delete_project(
    store: &dyn Store,
    project_id: Uuid,
) -> Result<CascadeSummary, StoreError> {
    let mut tx = store.begin().await?;

    if project_id.is_nil() {
        debug!("Nil project id, nothing to cascade");
        tx.rollback().await?;
        return Ok(CascadeSummary::default());
    }

    match cascade_project(tx.as_mut(), project_id).await {
        Ok(summary) => {
            tx.commit().await?;
            info!(
                project_id = %project_id,
                tasks_deleted = summary.tasks_deleted,
                notes_deleted = summary.notes_deleted,
                project_deleted = summary.project_deleted,
                "Project deleted"
            );
            Ok(summary)
        }
        Err(err) => {
            abort(tx, &err).await;
            Err(err)
        }
    }
}

/// Deletes one task together with its notes
///
/// `tasks_deleted` is 0 when the task did not exist.
pub async fn delete_task(store: &dyn Store, task_id: Uuid) -> Result<CascadeSummary, StoreError> {
    let mut tx = store.begin().await?;

    let result = async {
        let notes_deleted = tx.delete_notes_for_tasks(&[task_id]).await?;
        let deleted = tx.delete_task(task_id).await?;
        Ok::<_, StoreError>(CascadeSummary {
            tasks_deleted: u64::from(deleted),
            notes_deleted,
            project_deleted: false,
        })
    }
    .await;

    match result {
        Ok(summary) => {
            tx.commit().await?;
            info!(
                task_id = %task_id,
                notes_deleted = summary.notes_deleted,
                "Task deleted"
            );
            Ok(summary)
        }
        Err(err) => {
            abort(tx, &err).await;
            Err(err)
        }
    }
}

async fn cascade_project(
    tx: &mut dyn StoreTx,
    project_id: Uuid,
) -> Result<CascadeSummary, StoreError> {
    let task_ids = tx.task_ids_for_project(project_id).await?;
    debug!(project_id = %project_id, tasks = task_ids.len(), "Collected project tasks");

    let notes_deleted = tx.delete_notes_for_tasks(&task_ids).await?;
    let tasks_deleted = tx.delete_tasks_for_project(project_id).await?;
    let project_deleted = tx.delete_project(project_id).await?;

    Ok(CascadeSummary {
        tasks_deleted,
        notes_deleted,
        project_deleted,
    })
}

async fn abort(tx: Box<dyn StoreTx>, cause: &StoreError) {
    warn!(error = %cause, "Cascade failed, rolling back");
    if let Err(rollback_err) = tx.rollback().await {
        warn!(error = %rollback_err, "Rollback failed");
    }
}
