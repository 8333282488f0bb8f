/// Database models for UpTask
///
/// Each model owns its SQL. Handlers do not call these directly; they go
/// through [`crate::store::Store`], whose PostgreSQL implementation delegates
/// here.
///
/// # Models
///
/// - `user`: accounts (looked up, never registered here)
/// - `project`: projects with their manager and team
/// - `team`: project team membership rows
/// - `task`: project tasks and their status history
/// - `note`: notes attached to tasks

pub mod note;
pub mod project;
pub mod task;
pub mod team;
pub mod user;
