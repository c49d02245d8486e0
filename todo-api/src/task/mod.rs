use crate::entities::task;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

pub mod api;
pub mod repository;
pub mod service;
pub mod validation;

pub use repository::{InMemoryTaskRepository, SeaOrmTaskRepository, TaskRepository};
pub use service::{TaskService, TaskServiceError};

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Done,
}

impl TaskStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Pending, TaskStatus::InProgress, TaskStatus::Done];

    /// Returns the wire symbol of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Done => "DONE",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a raw string is not one of the known status symbols.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown task status '{0}'")]
pub struct ParseTaskStatusError(pub String);

impl FromStr for TaskStatus {
    type Err = ParseTaskStatusError;

    /// Parses a status symbol, ignoring ASCII case.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(raw))
            .ok_or_else(|| ParseTaskStatusError(raw.to_string()))
    }
}

impl From<task::Status> for TaskStatus {
    fn from(status: task::Status) -> Self {
        match status {
            task::Status::Pending => TaskStatus::Pending,
            task::Status::InProgress => TaskStatus::InProgress,
            task::Status::Done => TaskStatus::Done,
        }
    }
}

impl From<TaskStatus> for task::Status {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Pending => task::Status::Pending,
            TaskStatus::InProgress => task::Status::InProgress,
            TaskStatus::Done => task::Status::Done,
        }
    }
}

/// A persisted task.
#[derive(Debug, PartialEq, Clone, Eq)]
pub struct Task {
    id: i32,
    title: String,
    description: Option<String>,
    status: TaskStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(
        id: i32,
        title: String,
        description: Option<String>,
        status: TaskStatus,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title,
            description,
            status,
            created_at,
            updated_at,
        }
    }

    /// Returns the ID of the task.
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Returns the title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description, if any.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the status.
    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl From<task::Model> for Task {
    fn from(model: task::Model) -> Self {
        Task::new(
            model.id,
            model.title,
            model.description,
            TaskStatus::from(model.status),
            model.created_at,
            model.updated_at,
        )
    }
}

/// The writable part of a task, as handed to [`TaskRepository::save`].
///
/// A draft without an ID is inserted; a draft with an ID replaces that row.
#[derive(Debug, PartialEq, Clone, Eq)]
pub struct TaskDraft {
    pub id: Option<i32>,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
}

impl TaskDraft {
    /// Creates a draft for a task that has not been stored yet.
    pub fn new(title: String, description: Option<String>) -> Self {
        Self {
            id: None,
            title,
            description,
            status: TaskStatus::Pending,
        }
    }
}

impl From<Task> for TaskDraft {
    fn from(task: Task) -> Self {
        Self {
            id: Some(task.id),
            title: task.title,
            description: task.description,
            status: task.status,
        }
    }
}

/// Input for creating a task.
#[derive(Debug, PartialEq, Clone, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
}

/// Input for a full update of a task.
///
/// `status` is only applied when present.
#[derive(Debug, PartialEq, Clone, Eq)]
pub struct TaskUpdate {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_parse_status_ignoring_case() {
        assert_eq!("pending".parse::<TaskStatus>(), Ok(TaskStatus::Pending));
        assert_eq!("In_Progress".parse::<TaskStatus>(), Ok(TaskStatus::InProgress));
        assert_eq!("DONE".parse::<TaskStatus>(), Ok(TaskStatus::Done));
    }

    #[test]
    fn rejects_unknown_status_instead_of_defaulting() {
        let result = "bogus".parse::<TaskStatus>();
        assert_eq!(result, Err(ParseTaskStatusError("bogus".to_string())));
        assert!("".parse::<TaskStatus>().is_err());
        assert!("IN PROGRESS".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn status_display_matches_wire_symbol() {
        for status in TaskStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status));
        }
    }

    #[test]
    fn status_survives_entity_conversion() {
        for status in TaskStatus::ALL {
            let stored = task::Status::from(status);
            assert_eq!(TaskStatus::from(stored), status);
        }
    }

    #[test]
    fn new_draft_is_pending_and_unsaved() {
        let draft = TaskDraft::new("Write report".to_string(), None);
        assert_eq!(draft.id, None);
        assert_eq!(draft.status, TaskStatus::Pending);
    }
}
