//! Task records and their lifecycle states.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::settings::VideoSettings;

/// Unique identifier for a generation task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    /// Generate a new random task ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Task lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Submitted, worker not started yet
    #[default]
    Queued,
    /// Worker is running the pipeline
    Processing,
    /// Cancellation requested, worker has not reached a checkpoint yet
    Cancelling,
    /// Cancellation observed at a checkpoint; terminal
    Cancelled,
    /// Pipeline finished with a result; terminal
    Completed,
    /// Pipeline failed; terminal
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Queued => "queued",
            TaskStatus::Processing => "processing",
            TaskStatus::Cancelling => "cancelling",
            TaskStatus::Cancelled => "cancelled",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Cancelled | TaskStatus::Completed | TaskStatus::Failed
        )
    }

    /// Cancellation is only accepted before the task reaches a terminal or
    /// already-cancelling state.
    pub fn is_cancellable(&self) -> bool {
        matches!(self, TaskStatus::Queued | TaskStatus::Processing)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classification of a terminal failure, surfaced to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Provider was rate limited or unreachable; retries were exhausted
    TransientProvider,
    /// Provider rejected the request (auth, permissions, not found)
    PermanentProvider,
    /// Structured-output recovery produced no usable segments
    NoUsableSegments,
    /// No stock footage matched any segment
    NoFootageAvailable,
    /// Anything else
    Internal,
}

impl ErrorKind {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::TransientProvider | ErrorKind::NoUsableSegments)
    }

    /// A short next-step hint shown alongside the error message.
    pub fn suggestion(&self) -> &'static str {
        match self {
            ErrorKind::TransientProvider => "The service is busy. Please try again shortly.",
            ErrorKind::PermanentProvider => "Check the provider credentials and configuration.",
            ErrorKind::NoUsableSegments => "Try resubmitting, or rephrase the topic.",
            ErrorKind::NoFootageAvailable => "Try a more visual topic.",
            ErrorKind::Internal => "Please try again later.",
        }
    }
}

/// Error descriptor stored on a failed task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TaskError {
    pub message: String,
    pub kind: ErrorKind,
    pub retryable: bool,
    pub suggestion: String,
}

impl TaskError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
            retryable: kind.is_retryable(),
            suggestion: kind.suggestion().to_string(),
        }
    }
}

/// Output reference stored on a completed task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TaskResult {
    /// Path or URL of the rendered video.
    pub video_path: String,
}

/// A generation task as held in the task store.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Task {
    pub id: TaskId,
    pub status: TaskStatus,
    pub topic: String,
    pub settings: VideoSettings,
    /// 0-100, monotonically non-decreasing while processing.
    pub progress: u8,
    /// Human-readable description of the last pipeline step.
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set when cancellation is requested; the worker observes it at the
    /// next stage checkpoint.
    pub cancelled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<TaskResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<TaskError>,
}

impl Task {
    /// Create a freshly submitted task.
    pub fn new(topic: impl Into<String>, settings: VideoSettings) -> Self {
        let now = Utc::now();
        Self {
            id: TaskId::new(),
            status: TaskStatus::Queued,
            topic: topic.into(),
            settings,
            progress: 0,
            message: "Waiting to start processing...".to_string(),
            created_at: now,
            updated_at: now,
            cancelled: false,
            result: None,
            error: None,
        }
    }

    /// Worker picked up the task. Only a queued task moves to processing;
    /// a cancellation that won the race keeps its state and is observed at
    /// the first checkpoint.
    pub fn start(&mut self) {
        if self.status != TaskStatus::Queued {
            return;
        }
        self.status = TaskStatus::Processing;
        self.progress = 0;
        self.touch();
    }

    /// Update progress and message mid-pipeline. Progress never goes
    /// backwards.
    pub fn set_progress(&mut self, progress: u8, message: impl Into<String>) {
        self.progress = self.progress.max(progress.min(100));
        self.message = message.into();
        self.touch();
    }

    /// Caller requested cancellation.
    pub fn request_cancel(&mut self) {
        self.status = TaskStatus::Cancelling;
        self.cancelled = true;
        self.message = "Cancellation requested".to_string();
        self.touch();
    }

    /// Worker observed the cancellation flag at a checkpoint.
    pub fn mark_cancelled(&mut self) {
        self.status = TaskStatus::Cancelled;
        self.message = "Task was cancelled by user".to_string();
        self.touch();
    }

    /// Pipeline finished successfully.
    pub fn complete(&mut self, result: TaskResult) {
        self.status = TaskStatus::Completed;
        self.progress = 100;
        self.message = "Video generation complete".to_string();
        self.result = Some(result);
        self.touch();
    }

    /// Pipeline failed terminally.
    pub fn fail(&mut self, error: TaskError) {
        self.status = TaskStatus::Failed;
        self.message = error.message.clone();
        self.error = Some(error);
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task() -> Task {
        Task::new("weird facts", VideoSettings::default())
    }

    #[test]
    fn new_task_is_queued() {
        let t = task();
        assert_eq!(t.status, TaskStatus::Queued);
        assert_eq!(t.progress, 0);
        assert!(!t.cancelled);
        assert!(t.status.is_cancellable());
    }

    #[test]
    fn lifecycle_to_completed() {
        let mut t = task();
        t.start();
        assert_eq!(t.status, TaskStatus::Processing);
        t.set_progress(50, "Captions created");
        assert_eq!(t.progress, 50);
        t.complete(TaskResult {
            video_path: "/videos/out.mp4".to_string(),
        });
        assert_eq!(t.status, TaskStatus::Completed);
        assert_eq!(t.progress, 100);
        assert!(t.status.is_terminal());
        assert!(!t.status.is_cancellable());
    }

    #[test]
    fn progress_is_monotonic() {
        let mut t = task();
        t.start();
        t.set_progress(70, "Search terms generated");
        t.set_progress(30, "stale update");
        assert_eq!(t.progress, 70);
    }

    #[test]
    fn start_does_not_override_a_queued_cancellation() {
        let mut t = task();
        t.request_cancel();
        t.start();
        assert_eq!(t.status, TaskStatus::Cancelling);
        assert!(t.cancelled);
    }

    #[test]
    fn cancel_then_observed() {
        let mut t = task();
        t.start();
        t.request_cancel();
        assert_eq!(t.status, TaskStatus::Cancelling);
        assert!(t.cancelled);
        t.mark_cancelled();
        assert_eq!(t.status, TaskStatus::Cancelled);
        assert!(t.status.is_terminal());
        assert!(t.error.is_none());
    }

    #[test]
    fn failure_carries_descriptor() {
        let mut t = task();
        t.start();
        t.fail(TaskError::new(
            ErrorKind::NoFootageAvailable,
            "No background footage matched any segment",
        ));
        assert_eq!(t.status, TaskStatus::Failed);
        let err = t.error.unwrap();
        assert_eq!(err.kind, ErrorKind::NoFootageAvailable);
        assert!(!err.retryable);
        assert!(!err.suggestion.is_empty());
    }

    #[test]
    fn transient_errors_are_retryable() {
        let err = TaskError::new(ErrorKind::TransientProvider, "rate limited");
        assert!(err.retryable);
        let err = TaskError::new(ErrorKind::PermanentProvider, "bad key");
        assert!(!err.retryable);
    }
}
