// Callback Port - caller-supplied observers of a task's outcome

/// Boxed success observer
pub type SuccessCallback<T> = Box<dyn FnOnce(T) + Send + 'static>;

/// Boxed failure observer
pub type FailureCallback<E> = Box<dyn FnOnce(E) + Send + 'static>;

/// How a task settled, as seen by the queue's bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Succeeded,
    Failed,
}

/// Optional per-task callbacks
///
/// At most one of them fires, exactly once, when the task settles.
/// A missing callback is a no-op.
pub struct Callbacks<T, E> {
    on_success: Option<SuccessCallback<T>>,
    on_failure: Option<FailureCallback<E>>,
}

impl<T, E> Callbacks<T, E> {
    /// No callbacks: the outcome is dropped
    pub fn new() -> Self {
        Self {
            on_success: None,
            on_failure: None,
        }
    }

    pub fn on_success(mut self, f: impl FnOnce(T) + Send + 'static) -> Self {
        self.on_success = Some(Box::new(f));
        self
    }

    pub fn on_failure(mut self, f: impl FnOnce(E) + Send + 'static) -> Self {
        self.on_failure = Some(Box::new(f));
        self
    }

    pub fn has_success(&self) -> bool {
        self.on_success.is_some()
    }

    pub fn has_failure(&self) -> bool {
        self.on_failure.is_some()
    }

    /// Deliver the outcome to the matching callback
    pub(crate) fn settle(self, outcome: Result<T, E>) -> Settlement {
        match outcome {
            Ok(value) => {
                if let Some(f) = self.on_success {
                    f(value);
                }
                Settlement::Succeeded
            }
            Err(reason) => {
                if let Some(f) = self.on_failure {
                    f(reason);
                }
                Settlement::Failed
            }
        }
    }
}

impl<T, E> Default for Callbacks<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> std::fmt::Debug for Callbacks<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_success", &self.has_success())
            .field("on_failure", &self.has_failure())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_settle_success_fires_only_success() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let ok = Arc::clone(&seen);
        let err = Arc::clone(&seen);
        let callbacks = Callbacks::<i32, String>::new()
            .on_success(move |v| ok.lock().unwrap().push(format!("ok:{}", v)))
            .on_failure(move |e| err.lock().unwrap().push(format!("err:{}", e)));

        assert_eq!(callbacks.settle(Ok(7)), Settlement::Succeeded);
        assert_eq!(*seen.lock().unwrap(), vec!["ok:7".to_string()]);
    }

    #[test]
    fn test_settle_failure_passes_reason_unchanged() {
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        let callbacks =
            Callbacks::<(), String>::new().on_failure(move |e| *sink.lock().unwrap() = Some(e));

        assert_eq!(callbacks.settle(Err("boom".to_string())), Settlement::Failed);
        assert_eq!(seen.lock().unwrap().as_deref(), Some("boom"));
    }

    #[test]
    fn test_missing_callbacks_are_noops() {
        let callbacks = Callbacks::<i32, &str>::default();
        assert!(!callbacks.has_success());
        assert!(!callbacks.has_failure());
        assert_eq!(callbacks.settle(Err("ignored")), Settlement::Failed);
    }
}
