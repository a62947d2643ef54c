//! Task model for the user-scoped daily task list.

use jiff::civil::Date;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A task row, always scoped to its owning principal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier.
    pub id: Uuid,
    /// Short title.
    pub title: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Completion percentage, 0 through 100.
    pub progress: u8,
    /// Principal the task belongs to.
    pub user_id: Uuid,
    /// Day the task is scheduled for.
    pub date: Date,
}

impl Task {
    /// Returns whether the task has been completed.
    pub fn is_done(&self) -> bool {
        self.progress >= 100
    }
}

/// Data for creating a new task.
#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
pub struct NewTask {
    /// Short title.
    #[validate(length(min = 1, message = "task title must not be empty"))]
    pub title: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Completion percentage, 0 through 100.
    #[validate(range(max = 100, message = "progress is a percentage"))]
    pub progress: u8,
    /// Day the task is scheduled for.
    pub date: Date,
}

/// Data for updating a task.
///
/// Ownership cannot change: there is deliberately no `user_id` field, so a
/// caller can never move a task to another principal through this path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Validate)]
pub struct UpdateTask {
    /// New title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New completion percentage, 0 through 100.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(max = 100, message = "progress is a percentage"))]
    pub progress: Option<u8>,
}

impl UpdateTask {
    /// An update that marks the task complete.
    pub fn done() -> Self {
        Self {
            progress: Some(100),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use validator::Validate;

    use super::*;

    #[test]
    fn test_progress_over_100_is_rejected() {
        let task = NewTask {
            title: "ship it".into(),
            description: None,
            progress: 101,
            date: "2026-02-01".parse().unwrap(),
        };
        assert!(task.validate().is_err());
    }

    #[test]
    fn test_empty_title_is_rejected() {
        let task = NewTask {
            title: String::new(),
            description: None,
            progress: 0,
            date: "2026-02-01".parse().unwrap(),
        };
        assert!(task.validate().is_err());
    }

    #[test]
    fn test_done_update_sets_full_progress() {
        let update = UpdateTask::done();
        assert_eq!(update.progress, Some(100));
        assert!(update.validate().is_ok());
    }
}
