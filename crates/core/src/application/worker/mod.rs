// Worker - Slot bookkeeping and the drain loop

pub mod constants;
mod dispatch;
mod panic_guard;

pub use dispatch::Dispatch;
pub(crate) use dispatch::{dispatch_channel, DispatchSender};
pub use panic_guard::{execute_guarded, execute_guarded_async, PanicGuardResult};

use crate::domain::{QueueStats, TaskId, TaskState};
use crate::port::callback::Settlement;
use futures::future::BoxFuture;
use std::collections::VecDeque;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;
use tracing::{debug, info, warn};

/// A task with its callbacks, type-erased; calling it invokes the task's
/// factory and returns the future that settles it
pub(crate) type Job = Box<dyn FnOnce() -> BoxFuture<'static, Settlement> + Send + 'static>;

/// A submission that is waiting for, or holding, a worker slot
pub(crate) struct PendingRequest {
    pub(crate) id: TaskId,
    pub(crate) job: Job,
    pub(crate) dispatch: DispatchSender,
}

/// A request whose factory has been invoked
pub(crate) struct Started {
    id: TaskId,
    launched: PanicGuardResult<BoxFuture<'static, Settlement>>,
}

/// Mutable queue state; only ever touched under `Shared::state`
struct SlotState {
    available: usize,
    waiting: VecDeque<PendingRequest>,
}

/// Outcome counters
#[derive(Default)]
struct Counters {
    submitted: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    panicked: AtomicU64,
    abandoned: AtomicU64,
}

/// State shared between the queue handle and its workers
pub(crate) struct Shared {
    name: String,
    limit: usize,
    state: Mutex<SlotState>,
    idle: Notify,
    next_id: AtomicU64,
    counters: Counters,
}

/// Where a new submission went
pub(crate) enum Admission {
    /// A slot was taken; the caller must start the request and a worker for it
    Run(PendingRequest),
    /// Appended to the waiting list
    Queued,
}

impl Shared {
    pub(crate) fn new(name: String, limit: usize) -> Self {
        Self {
            name,
            limit,
            state: Mutex::new(SlotState {
                available: limit,
                waiting: VecDeque::new(),
            }),
            idle: Notify::new(),
            next_id: AtomicU64::new(1),
            counters: Counters::default(),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn limit(&self) -> usize {
        self.limit
    }

    pub(crate) fn next_id(&self) -> TaskId {
        TaskId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    // No caller code runs under the lock, so a poisoned guard is still consistent.
    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take a free slot for `request`, or append it to the waiting list
    pub(crate) fn admit(&self, request: PendingRequest) -> Admission {
        self.counters.submitted.fetch_add(1, Ordering::Relaxed);
        let mut state = self.lock();
        if state.available > 0 {
            state.available -= 1;
            Admission::Run(request)
        } else {
            state.waiting.push_back(request);
            Admission::Queued
        }
    }

    /// Called after a settlement: hand the held slot to the head of the
    /// waiting list, or give it back if nothing is waiting.
    fn release_or_handoff(&self) -> Option<PendingRequest> {
        let mut state = self.lock();
        if let Some(next) = state.waiting.pop_front() {
            return Some(next);
        }
        state.available += 1;
        debug_assert!(state.available <= self.limit);
        if state.available == self.limit {
            drop(state);
            self.idle.notify_waiters();
        }
        None
    }

    pub(crate) fn is_idle(&self) -> bool {
        let state = self.lock();
        state.available == self.limit && state.waiting.is_empty()
    }

    /// Resolve once nothing is running or waiting
    pub(crate) async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            // Register before checking so a release in between is not missed
            notified.as_mut().enable();
            if self.is_idle() {
                return;
            }
            notified.await;
        }
    }

    pub(crate) fn stats(&self) -> QueueStats {
        let (available, waiting) = {
            let state = self.lock();
            (state.available, state.waiting.len())
        };
        QueueStats {
            limit: self.limit,
            running: self.limit - available,
            waiting,
            available,
            submitted: self.counters.submitted.load(Ordering::Relaxed),
            succeeded: self.counters.succeeded.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            panicked: self.counters.panicked.load(Ordering::Relaxed),
            abandoned: self.counters.abandoned.load(Ordering::Relaxed),
        }
    }

    fn record(&self, id: TaskId, result: PanicGuardResult<Settlement>) {
        match result {
            PanicGuardResult::Success(Settlement::Succeeded) => {
                self.counters.succeeded.fetch_add(1, Ordering::Relaxed);
                debug!(
                    queue = %self.name,
                    task_id = %id,
                    state = %TaskState::Settled,
                    "Task succeeded"
                );
            }
            PanicGuardResult::Success(Settlement::Failed) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                debug!(
                    queue = %self.name,
                    task_id = %id,
                    state = %TaskState::Settled,
                    "Task failed"
                );
            }
            PanicGuardResult::Panicked(msg) => {
                self.counters.panicked.fetch_add(1, Ordering::Relaxed);
                warn!(
                    queue = %self.name,
                    task_id = %id,
                    state = %TaskState::Settled,
                    panic_msg = %msg,
                    "Task panicked, reclaiming slot"
                );
            }
        }
    }
}

/// Start a request that holds a slot: signal dispatch, then invoke its
/// factory on the calling thread
pub(crate) fn start(request: PendingRequest) -> Started {
    let PendingRequest { id, job, dispatch } = request;
    debug!(task_id = %id, state = %TaskState::Running, "Task starting");
    dispatch.dispatched();
    Started {
        id,
        launched: execute_guarded(AssertUnwindSafe(job)),
    }
}

/// Gives the worker's slot back if the worker is dropped before it finishes,
/// which only happens when its runtime shuts down. Waiting requests are
/// discarded, so their `Dispatch` signals resolve.
struct SlotGuard {
    shared: Arc<Shared>,
    armed: bool,
}

impl SlotGuard {
    fn new(shared: Arc<Shared>) -> Self {
        Self {
            shared,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        // The in-flight task is lost along with the worker
        let mut abandoned = 1u64;
        while let Some(request) = self.shared.release_or_handoff() {
            drop(request);
            abandoned += 1;
        }
        self.shared
            .counters
            .abandoned
            .fetch_add(abandoned, Ordering::Relaxed);
        warn!(
            queue = %self.shared.name,
            abandoned = abandoned,
            "Worker dropped before finishing, slot returned"
        );
    }
}

/// Worker loop: settle the started request, then keep draining the waiting
/// list with the same slot until the list is empty.
///
/// The slot guard is built before the future is first polled, so a worker
/// dropped unpolled still returns its slot.
pub(crate) fn run(shared: Arc<Shared>, first: Started) -> impl Future<Output = ()> + Send + 'static {
    let mut guard = SlotGuard::new(Arc::clone(&shared));
    async move {
        let mut next = Some(first);
        let mut drained = 0usize;
        while let Some(Started { id, launched }) = next.take() {
            let result = match launched {
                PanicGuardResult::Success(future) => execute_guarded_async(future).await,
                PanicGuardResult::Panicked(msg) => PanicGuardResult::Panicked(msg),
            };
            shared.record(id, result);

            next = shared.release_or_handoff().map(start);
            if next.is_some() {
                drained += 1;
            }
        }
        guard.disarm();
        if drained > 0 {
            info!(
                queue = %shared.name(),
                drained = drained,
                "Worker released slot after draining waiting list"
            );
        }
    }
}
