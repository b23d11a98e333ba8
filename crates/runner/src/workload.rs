//! Synthetic workload driven through the queue

use crate::settings::WorkloadConfig;
use rand::Rng;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use taskgate_core::{AsyncQueue, Callbacks};
use thiserror::Error;
use tokio::time::sleep;
use tracing::{info, warn};

/// Failure injected into every `fail_every`-th task
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("injected failure in task {index}")]
pub struct InjectedFailure {
    pub index: usize,
}

/// Outcome of a workload run
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub queue: String,
    pub concurrency: usize,
    pub submitted: usize,
    /// Highest number of tasks observed in flight at once
    pub max_in_flight: usize,
    /// Task indices in the order they started
    pub start_order: Vec<usize>,
    /// Task indices in the order their success callback fired
    pub succeeded: Vec<usize>,
    /// Task indices whose failure callback fired
    pub failed: Vec<usize>,
    pub elapsed_ms: u128,
}

#[derive(Default)]
struct Tracker {
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    started: Mutex<Vec<usize>>,
    succeeded: Mutex<Vec<usize>>,
    failed: Mutex<Vec<usize>>,
}

impl Tracker {
    fn start(&self, index: usize) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        push(&self.started, index);
    }

    fn finish(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

fn push(list: &Mutex<Vec<usize>>, index: usize) {
    list.lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .push(index);
}

fn take(list: &Mutex<Vec<usize>>) -> Vec<usize> {
    std::mem::take(&mut *list.lock().unwrap_or_else(std::sync::PoisonError::into_inner))
}

fn task_duration(config: &WorkloadConfig) -> Duration {
    let jitter = if config.jitter_ms > 0 {
        rand::thread_rng().gen_range(0..=config.jitter_ms)
    } else {
        0
    };
    Duration::from_millis(config.duration_ms.saturating_add(jitter))
}

/// Submit `config.tasks` tasks (indices `1..=tasks`) and wait for all of them
pub async fn run(queue: &AsyncQueue, config: &WorkloadConfig) -> Summary {
    let tracker = Arc::new(Tracker::default());
    let started_at = Instant::now();

    info!(
        queue = %queue.name(),
        tasks = config.tasks,
        concurrency = queue.limit(),
        "Submitting workload"
    );

    for index in 1..=config.tasks {
        let duration = task_duration(config);
        let fails = config.fail_every > 0 && index % config.fail_every == 0;

        let task_tracker = Arc::clone(&tracker);
        let ok_tracker = Arc::clone(&tracker);
        let err_tracker = Arc::clone(&tracker);

        let callbacks = Callbacks::new()
            .on_success(move |index: usize| push(&ok_tracker.succeeded, index))
            .on_failure(move |err: InjectedFailure| {
                warn!(error = %err, "Task failed");
                push(&err_tracker.failed, err.index);
            });

        // Recorded when the queue invokes the task, not when its future is first polled
        queue.submit(
            move || {
                task_tracker.start(index);
                async move {
                    sleep(duration).await;
                    task_tracker.finish();
                    if fails {
                        Err(InjectedFailure { index })
                    } else {
                        Ok(index)
                    }
                }
            },
            callbacks,
        );
    }

    queue.idle().await;

    let summary = Summary {
        queue: queue.name().to_string(),
        concurrency: queue.limit(),
        submitted: config.tasks,
        max_in_flight: tracker.max_in_flight.load(Ordering::SeqCst),
        start_order: take(&tracker.started),
        succeeded: take(&tracker.succeeded),
        failed: take(&tracker.failed),
        elapsed_ms: started_at.elapsed().as_millis(),
    };

    info!(
        max_in_flight = summary.max_in_flight,
        succeeded = summary.succeeded.len(),
        failed = summary.failed.len(),
        elapsed_ms = summary.elapsed_ms,
        "Workload finished"
    );
    summary
}
