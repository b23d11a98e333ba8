//! AsyncQueue - bounded-concurrency FIFO task queue
//!
//! At most `concurrency` submitted tasks are in flight at once. A submission
//! that finds a free worker slot starts immediately; otherwise it waits in a
//! FIFO list and is started by whichever worker settles next.

use crate::application::worker::constants::DEFAULT_CONCURRENCY;
use crate::application::worker::{self, dispatch_channel, Admission, Dispatch, PendingRequest, Shared};
use crate::domain::{QueueConfig, QueueStats, TaskOutcomeError, TaskState};
use crate::error::Result;
use crate::port::Callbacks;
use futures::FutureExt;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, info};

/// Bounded-concurrency task queue
///
/// Cloning is cheap; clones share the same slots and waiting list.
#[derive(Clone)]
pub struct AsyncQueue {
    shared: Arc<Shared>,
    handle: Handle,
}

impl AsyncQueue {
    /// Create a queue with `concurrency` worker slots on the current tokio runtime
    ///
    /// # Errors
    /// - `QueueError::InvalidConcurrency` if `concurrency` is zero
    /// - `QueueError::RuntimeUnavailable` if called outside a tokio runtime
    pub fn new(concurrency: usize) -> Result<Self> {
        Self::with_config(QueueConfig {
            concurrency,
            ..QueueConfig::default()
        })
    }

    /// Create a queue with the default limit of three slots
    pub fn with_default_limit() -> Result<Self> {
        Self::new(DEFAULT_CONCURRENCY)
    }

    pub fn with_config(config: QueueConfig) -> Result<Self> {
        config.validate()?;
        let handle = Handle::try_current()?;
        Self::with_handle(config, handle)
    }

    /// Create a queue whose workers are spawned on `handle`
    pub fn with_handle(config: QueueConfig, handle: Handle) -> Result<Self> {
        config.validate()?;
        info!(
            queue = %config.name,
            concurrency = config.concurrency,
            "Queue created"
        );
        Ok(Self {
            shared: Arc::new(Shared::new(config.name, config.concurrency)),
            handle,
        })
    }

    pub fn name(&self) -> &str {
        self.shared.name()
    }

    pub fn limit(&self) -> usize {
        self.shared.limit()
    }

    /// Submit a task
    ///
    /// The task is invoked exactly once. If a slot is free, `task` is called
    /// before `submit` returns, on the caller's thread, so tasks admitted
    /// straight away start in submission order whatever the runtime flavor.
    /// Otherwise it is called by the worker that frees the next slot, after
    /// every earlier waiting task. Only the future it returns is polled on
    /// the runtime, so when that future is first polled is up to the
    /// scheduler.
    ///
    /// The outcome goes to `callbacks` only; the returned `Dispatch` resolves
    /// when the task starts and never fails.
    pub fn submit<F, Fut, T, E>(&self, task: F, callbacks: Callbacks<T, E>) -> Dispatch
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        let id = self.shared.next_id();
        let job: worker::Job = Box::new(move || {
            let running = task();
            async move { callbacks.settle(running.await) }.boxed()
        });

        // Admission state is only known after `admit`
        let (dispatch_tx, dispatch) = dispatch_channel(id, TaskState::Running);
        let request = PendingRequest {
            id,
            job,
            dispatch: dispatch_tx,
        };

        match self.shared.admit(request) {
            Admission::Run(request) => {
                debug!(queue = %self.name(), task_id = %id, "Slot free, starting task");
                let started = worker::start(request);
                // A runtime that has shut down drops the worker, which returns the slot
                self.handle.spawn(worker::run(Arc::clone(&self.shared), started));
                dispatch
            }
            Admission::Queued => {
                debug!(queue = %self.name(), task_id = %id, "No free slot, task waiting");
                dispatch.into_waiting()
            }
        }
    }

    /// Submit a task without callbacks; its outcome is discarded
    pub fn submit_task<F, Fut, T, E>(&self, task: F) -> Dispatch
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        self.submit(task, Callbacks::new())
    }

    /// Submit a task and wait for its outcome
    ///
    /// Goes through the same admission path as `submit`; the outcome is
    /// carried back by the task's callbacks.
    pub async fn run<F, Fut, T, E>(&self, task: F) -> std::result::Result<T, TaskOutcomeError<E>>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        let (tx, rx) = oneshot::channel::<std::result::Result<T, E>>();
        let tx = Arc::new(Mutex::new(Some(tx)));
        let on_ok = Arc::clone(&tx);
        let on_err = tx;

        let callbacks = Callbacks::new()
            .on_success(move |value| send_outcome(&on_ok, Ok(value)))
            .on_failure(move |reason| send_outcome(&on_err, Err(reason)));
        let _ = self.submit(task, callbacks);

        match rx.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(reason)) => Err(TaskOutcomeError::Failed(reason)),
            Err(_) => Err(TaskOutcomeError::Aborted),
        }
    }

    /// Resolve once no task is running and none is waiting
    pub async fn idle(&self) {
        self.shared.wait_idle().await
    }

    pub fn stats(&self) -> QueueStats {
        self.shared.stats()
    }

    pub fn running(&self) -> usize {
        self.stats().running
    }

    pub fn waiting(&self) -> usize {
        self.stats().waiting
    }
}

impl std::fmt::Debug for AsyncQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncQueue")
            .field("name", &self.name())
            .field("stats", &self.stats())
            .finish()
    }
}

type OutcomeSender<T, E> = Arc<Mutex<Option<oneshot::Sender<std::result::Result<T, E>>>>>;

fn send_outcome<T, E>(slot: &OutcomeSender<T, E>, outcome: std::result::Result<T, E>) {
    let sender = slot
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .take();
    if let Some(sender) = sender {
        let _ = sender.send(outcome);
    }
}
