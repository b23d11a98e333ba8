// Task Outcome Error

use thiserror::Error;

/// Error returned by `AsyncQueue::run`
///
/// `Failed` carries the task's own failure reason, unchanged.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TaskOutcomeError<E> {
    #[error("Task failed: {0}")]
    Failed(E),

    #[error("Task aborted before settling (panicked or runtime shut down)")]
    Aborted,
}

impl<E> TaskOutcomeError<E> {
    /// The failure reason, if the task settled with one
    pub fn into_failure(self) -> Option<E> {
        match self {
            TaskOutcomeError::Failed(e) => Some(e),
            TaskOutcomeError::Aborted => None,
        }
    }
}
