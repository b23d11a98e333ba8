// Central Error Type for the Queue

use thiserror::Error;

/// Queue-level error type
///
/// Only construction and configuration can fail. A task's own failure is
/// never turned into a `QueueError`; it goes to the task's failure callback.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("Invalid concurrency limit: {0} (must be at least 1)")]
    InvalidConcurrency(usize),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Runtime unavailable: {0}")]
    RuntimeUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using QueueError
pub type Result<T> = std::result::Result<T, QueueError>;

impl From<tokio::runtime::TryCurrentError> for QueueError {
    fn from(err: tokio::runtime::TryCurrentError) -> Self {
        QueueError::RuntimeUnavailable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_concurrency_message() {
        let err = QueueError::InvalidConcurrency(0);
        assert!(err.to_string().contains("at least 1"));
    }

    #[test]
    fn test_runtime_unavailable_from_try_current() {
        // No runtime is entered in a plain #[test]
        let err = tokio::runtime::Handle::try_current().unwrap_err();
        let err: QueueError = err.into();
        assert!(matches!(err, QueueError::RuntimeUnavailable(_)));
    }
}
