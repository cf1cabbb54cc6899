//! Worker error types.

use reel_models::{ErrorKind, TaskError};
use reel_providers::ProviderError;
use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("no usable segments could be recovered from model output")]
    NoUsableSegments,

    #[error("no background footage matched any segment")]
    NoFootageAvailable,

    /// Cancellation observed at a checkpoint. Not a failure; the pipeline
    /// maps it to the cancelled state instead of an error descriptor.
    #[error("task cancelled by user")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    /// Build the client-facing error descriptor for a terminal failure.
    ///
    /// The message is ours, not raw provider text.
    pub fn into_task_error(self) -> TaskError {
        match self {
            WorkerError::Provider(ProviderError::Transient(_)) => TaskError::new(
                ErrorKind::TransientProvider,
                "An upstream service was unavailable and retries were exhausted",
            ),
            WorkerError::Provider(ProviderError::Permanent(_)) => TaskError::new(
                ErrorKind::PermanentProvider,
                "An upstream service rejected the request",
            ),
            WorkerError::Provider(ProviderError::InvalidResponse(_)) => TaskError::new(
                ErrorKind::Internal,
                "An upstream service returned an unexpected response",
            ),
            WorkerError::NoUsableSegments => TaskError::new(
                ErrorKind::NoUsableSegments,
                "Could not derive timed search keywords from the generated script",
            ),
            WorkerError::NoFootageAvailable => TaskError::new(
                ErrorKind::NoFootageAvailable,
                "No background video available",
            ),
            WorkerError::Cancelled => {
                // Callers route cancellation before building a descriptor;
                // keep a sane fallback anyway.
                TaskError::new(ErrorKind::Internal, "Task was cancelled")
            }
            WorkerError::Io(_) => TaskError::new(
                ErrorKind::Internal,
                "A local file operation failed during processing",
            ),
        }
    }
}
