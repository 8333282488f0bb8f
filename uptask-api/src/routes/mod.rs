/// API route handlers
///
/// Organized by resource:
///
/// - `health`: liveness and store connectivity
/// - `projects`: project CRUD and cascade delete
/// - `tasks`: project tasks and their status
/// - `team`: project team management
/// - `notes`: task notes

use serde::{Deserialize, Serialize};

pub mod health;
pub mod notes;
pub mod projects;
pub mod tasks;
pub mod team;

/// Body of responses that only confirm an action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
