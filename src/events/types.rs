//! Notification payloads relayed from the engine.

use chrono::{DateTime, Utc};

use crate::core::types::TaskId;

/// A task's scheduled time has arrived.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDue {
    /// The task that is due.
    pub task_id: TaskId,
    /// The schedule occurrence that triggered the notification.
    pub scheduled_for: DateTime<Utc>,
}

impl TaskDue {
    /// Create a due notification for the current instant.
    pub fn now(task_id: impl Into<TaskId>) -> Self {
        Self {
            task_id: task_id.into(),
            scheduled_for: Utc::now(),
        }
    }

    /// Create a due notification for a specific occurrence.
    pub fn new(task_id: impl Into<TaskId>, scheduled_for: DateTime<Utc>) -> Self {
        Self {
            task_id: task_id.into(),
            scheduled_for,
        }
    }
}

/// A due task's run failed.
///
/// The engine may suppress the failure itself when retry-on-error is
/// enabled; the adapter relays whatever the engine reports.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionError {
    /// The task whose run failed.
    pub task_id: TaskId,
    /// Engine-supplied failure description.
    pub message: String,
    /// Whether the engine will retry the run.
    pub will_retry: bool,
}

impl ExecutionError {
    /// Create an execution-error notification.
    pub fn new(task_id: impl Into<TaskId>, message: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            message: message.into(),
            will_retry: false,
        }
    }

    /// Mark the failure as one the engine will retry.
    pub fn with_retry(mut self) -> Self {
        self.will_retry = true;
        self
    }
}

/// The engine failed to refresh its task list from the source.
///
/// Independent of any single task run.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadingError {
    /// The task source the engine was reading.
    pub source: String,
    /// Engine-supplied failure description.
    pub message: String,
}

impl LoadingError {
    /// Create a loading-error notification.
    pub fn new(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            message: message.into(),
        }
    }
}

/// Merged error payload carried by the v1 contract's single error channel.
///
/// `task_id` is present only for execution failures; loading failures have
/// no associated task.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorEvent {
    /// The failed task, when the error belongs to one.
    pub task_id: Option<TaskId>,
    /// Failure description.
    pub message: String,
}

impl From<ExecutionError> for ErrorEvent {
    fn from(error: ExecutionError) -> Self {
        Self {
            task_id: Some(error.task_id),
            message: error.message,
        }
    }
}

impl From<LoadingError> for ErrorEvent {
    fn from(error: LoadingError) -> Self {
        Self {
            task_id: None,
            message: format!("{}: {}", error.source, error.message),
        }
    }
}
