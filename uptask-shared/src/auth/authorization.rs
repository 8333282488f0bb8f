/// Project-level permission checks
///
/// # Permission model
///
/// 1. **Manager**: the user who created the project. Edits and deletes the
///    project, manages its tasks and its team.
/// 2. **Team member**: added by the manager. Reads the project and its
///    tasks, changes task status, writes notes.
/// 3. **Note author**: only the author may delete a note.
///
/// Checks are pure functions over already-loaded records; they never touch
/// the store.
///
/// # Example
///
/// ```
/// use uptask_shared::auth::authorization::{require_manager, AuthzError};
/// # use uptask_shared::models::project::Project;
/// # use uuid::Uuid;
/// # fn example(project: &Project, user_id: Uuid) -> Result<(), AuthzError> {
/// require_manager(project, user_id)?;
/// # Ok(())
/// # }
/// ```

use uuid::Uuid;

use crate::models::note::Note;
use crate::models::project::Project;
use crate::models::task::Task;

/// Authorization failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    #[error("user {user_id} does not manage project {project_id}")]
    NotManager { project_id: Uuid, user_id: Uuid },

    #[error("user {user_id} is not on project {project_id}")]
    NotMember { project_id: Uuid, user_id: Uuid },

    #[error("user {user_id} did not write note {note_id}")]
    NotNoteAuthor { note_id: Uuid, user_id: Uuid },

    /// Reported as not-found: the task exists but not under this project
    #[error("task {task_id} does not belong to project {project_id}")]
    TaskNotInProject { task_id: Uuid, project_id: Uuid },

    /// Reported as not-found: the note exists but not under this task
    #[error("note {note_id} does not belong to task {task_id}")]
    NoteNotInTask { note_id: Uuid, task_id: Uuid },
}

pub fn require_manager(project: &Project, user_id: Uuid) -> Result<(), AuthzError> {
    if project.is_manager(user_id) {
        Ok(())
    } else {
        Err(AuthzError::NotManager {
            project_id: project.id,
            user_id,
        })
    }
}

/// Manager or team member
pub fn require_member(project: &Project, user_id: Uuid) -> Result<(), AuthzError> {
    if project.is_member(user_id) {
        Ok(())
    } else {
        Err(AuthzError::NotMember {
            project_id: project.id,
            user_id,
        })
    }
}

pub fn require_task_in_project(task: &Task, project: &Project) -> Result<(), AuthzError> {
    if task.project_id == project.id {
        Ok(())
    } else {
        Err(AuthzError::TaskNotInProject {
            task_id: task.id,
            project_id: project.id,
        })
    }
}

pub fn require_note_in_task(note: &Note, task: &Task) -> Result<(), AuthzError> {
    if note.task_id == task.id {
        Ok(())
    } else {
        Err(AuthzError::NoteNotInTask {
            note_id: note.id,
            task_id: task.id,
        })
    }
}

pub fn require_note_author(note: &Note, user_id: Uuid) -> Result<(), AuthzError> {
    if note.is_author(user_id) {
        Ok(())
    } else {
        Err(AuthzError::NotNoteAuthor {
            note_id: note.id,
            user_id,
        })
    }
}
