//! Task database models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::time;
use crate::utils::Clock;

/// Task database model.
/// One recorded attempt at a pipeline-stage operation on an item.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TaskDbModel {
    pub id: String,
    /// Item the task operates on; a task never owns its item.
    pub item_id: Option<String>,
    /// Stage label (see [`TaskType`]).
    pub task_type: String,
    /// Status: PENDING, RUNNING, COMPLETED, FAILED, CANCELLED
    pub status: String,
    pub created_at: String,
    /// Set at most once, on the first transition into RUNNING.
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    /// Progress fraction in [0, 1].
    pub progress: f64,
    /// Opaque JSON blob with the stage result.
    pub result: Option<String>,
    pub error_message: Option<String>,
    /// Number of failed attempts, not total attempts.
    pub retry_count: i64,
}

impl TaskDbModel {
    pub fn new(task_type: TaskType, item_id: Option<&str>, clock: &dyn Clock) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            item_id: item_id.map(str::to_string),
            task_type: task_type.as_str().to_string(),
            status: TaskStatus::Pending.as_str().to_string(),
            created_at: time::to_db(clock.now()),
            started_at: None,
            completed_at: None,
            progress: 0.0,
            result: None,
            error_message: None,
            retry_count: 0,
        }
    }
}

/// Pipeline stage labels.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    Discovery,
    Analysis,
    Classification,
    Metadata,
    Publish,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discovery => "DISCOVERY",
            Self::Analysis => "ANALYSIS",
            Self::Classification => "CLASSIFICATION",
            Self::Metadata => "METADATA",
            Self::Publish => "PUBLISH",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "DISCOVERY" => Some(Self::Discovery),
            "ANALYSIS" => Some(Self::Analysis),
            "CLASSIFICATION" => Some(Self::Classification),
            "METADATA" => Some(Self::Metadata),
            "PUBLISH" => Some(Self::Publish),
            _ => None,
        }
    }
}

/// Task status values.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Task is queued and waiting to be picked up.
    Pending,
    /// Task is currently being executed.
    Running,
    /// Task finished successfully.
    Completed,
    /// Task failed; the error message records why.
    Failed,
    /// Task was cancelled before completion.
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "RUNNING" => Some(Self::Running),
            "COMPLETED" => Some(Self::Completed),
            "FAILED" => Some(Self::Failed),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Terminal statuses stamp a completion time.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::SystemClock;

    #[test]
    fn new_task_defaults() {
        let task = TaskDbModel::new(TaskType::Analysis, Some("item-1"), &SystemClock);
        assert_eq!(task.status, "PENDING");
        assert_eq!(task.task_type, "ANALYSIS");
        assert_eq!(task.progress, 0.0);
        assert!(task.started_at.is_none());
    }

    #[test]
    fn task_status_terminal() {
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
        assert!(TaskStatus::Cancelled.is_terminal());
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
    }
}
