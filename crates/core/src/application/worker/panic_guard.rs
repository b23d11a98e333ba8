// Panic isolation for worker safety
use super::constants::UNKNOWN_PANIC_MESSAGE;
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::error;

/// Result of a panic-guarded execution
#[derive(Debug, PartialEq, Eq)]
pub enum PanicGuardResult<T> {
    /// Execution completed
    Success(T),
    /// Execution panicked
    Panicked(String),
}

impl<T> PanicGuardResult<T> {
    pub fn is_panicked(&self) -> bool {
        matches!(self, PanicGuardResult::Panicked(_))
    }
}

/// Execute a closure with panic isolation
///
/// If the closure panics, the panic is caught and returned as
/// `PanicGuardResult::Panicked`. Used for task factories, which run
/// synchronously when a task is started.
pub fn execute_guarded<F, T>(f: F) -> PanicGuardResult<T>
where
    F: FnOnce() -> T + std::panic::UnwindSafe,
{
    match catch_unwind(f) {
        Ok(result) => PanicGuardResult::Success(result),
        Err(payload) => {
            let panic_msg = panic_message(payload.as_ref());
            error!(panic_msg = %panic_msg, "Task factory panicked");
            PanicGuardResult::Panicked(panic_msg)
        }
    }
}

/// Execute a future with panic isolation
///
/// Catches panics raised while the future is polled. A panicking task must
/// not take its worker slot down with it.
pub async fn execute_guarded_async<F, T>(future: F) -> PanicGuardResult<T>
where
    F: Future<Output = T>,
{
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(result) => PanicGuardResult::Success(result),
        Err(payload) => {
            let panic_msg = panic_message(payload.as_ref());
            error!(panic_msg = %panic_msg, "Async task panicked");
            PanicGuardResult::Panicked(panic_msg)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        UNKNOWN_PANIC_MESSAGE.to_string()
    }
}
