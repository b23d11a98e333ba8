//! Queue scenarios: bounded concurrency, FIFO for waiters, failure isolation

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use taskgate_core::{AsyncQueue, Callbacks, QueueError};
use tokio::time::sleep;

/// Scenario A: limit 3, ten 100ms tasks, exactly 3 in flight at the peak
#[tokio::test(start_paused = true)]
async fn test_scenario_a_bounded_concurrency() {
    let queue = AsyncQueue::new(3).unwrap();
    let running = Arc::new(AtomicUsize::new(0));
    let max_seen = Arc::new(AtomicUsize::new(0));

    let dispatches: Vec<_> = (0..10)
        .map(|_| {
            let running = Arc::clone(&running);
            let max_seen = Arc::clone(&max_seen);
            queue.submit_task(move || async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                sleep(Duration::from_millis(100)).await;
                running.fetch_sub(1, Ordering::SeqCst);
                Ok::<_, ()>(())
            })
        })
        .collect();

    assert_eq!(queue.running(), 3);
    assert_eq!(queue.waiting(), 7);

    // Every submission resolves once its task has started
    futures::future::join_all(dispatches).await;
    queue.idle().await;

    assert_eq!(max_seen.load(Ordering::SeqCst), 3);
    assert_eq!(running.load(Ordering::SeqCst), 0);
    let stats = queue.stats();
    assert_eq!(stats.succeeded, 10);
    assert_eq!(stats.available, 3);
}

/// Scenario B: limit 1, values 1..=5 with jitter, callbacks in submission order
#[tokio::test(start_paused = true)]
async fn test_scenario_b_fifo_with_jitter() {
    let queue = AsyncQueue::new(1).unwrap();
    let order = Arc::new(Mutex::new(Vec::new()));

    // Reverse durations: earlier tasks take longer
    for value in 1..=5u64 {
        let order = Arc::clone(&order);
        queue.submit(
            move || async move {
                sleep(Duration::from_millis(60 - value * 10)).await;
                Ok::<_, ()>(value)
            },
            Callbacks::new().on_success(move |v| order.lock().unwrap().push(v)),
        );
    }

    queue.idle().await;
    assert_eq!(*order.lock().unwrap(), vec![1, 2, 3, 4, 5]);
}

/// Scenario C: limit 3, third task fails with "boom"
#[tokio::test]
async fn test_scenario_c_failure_isolated() {
    let queue = AsyncQueue::new(3).unwrap();
    let successes = Arc::new(Mutex::new(Vec::new()));
    let failures = Arc::new(Mutex::new(Vec::new()));

    for num in 1..=5 {
        let ok = Arc::clone(&successes);
        let err = Arc::clone(&failures);
        queue.submit(
            move || async move {
                if num == 3 {
                    Err("boom")
                } else {
                    Ok(num)
                }
            },
            Callbacks::new()
                .on_success(move |v| ok.lock().unwrap().push(v))
                .on_failure(move |e| err.lock().unwrap().push(e)),
        );
    }

    queue.idle().await;

    let successes = successes.lock().unwrap().clone();
    // Task 4 takes the failed task's slot before 5 takes the next one
    let position = |v| successes.iter().position(|&s| s == v).unwrap();
    assert!(position(4) < position(5));
    let mut sorted = successes.clone();
    sorted.sort();
    assert_eq!(sorted, vec![1, 2, 4, 5]);
    assert_eq!(*failures.lock().unwrap(), vec!["boom"]);

    let stats = queue.stats();
    assert_eq!(stats.succeeded, 4);
    assert_eq!(stats.failed, 1);
}

/// Scenario D: a zero limit is rejected at construction
#[tokio::test]
async fn test_scenario_d_zero_limit_rejected() {
    assert_eq!(
        AsyncQueue::new(0).unwrap_err(),
        QueueError::InvalidConcurrency(0)
    );
}

/// Beyond the first N, waiting tasks start in submission order at limit N
#[tokio::test(start_paused = true)]
async fn test_waiters_start_in_submission_order() {
    let queue = AsyncQueue::new(3).unwrap();
    let started = Arc::new(Mutex::new(Vec::new()));

    for index in 0..10u64 {
        let started = Arc::clone(&started);
        queue.submit_task(move || async move {
            started.lock().unwrap().push(index);
            // Varying durations so workers settle in a shuffled order
            sleep(Duration::from_millis(10 + (index * 37) % 50)).await;
            Ok::<_, ()>(())
        });
    }

    queue.idle().await;
    assert_eq!(*started.lock().unwrap(), (0..10).collect::<Vec<_>>());
}

/// Tasks admitted straight away are invoked in submission order on a
/// multi-threaded runtime, even when submitted from a spawned task
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_admitted_tasks_start_in_order_on_multi_thread_runtime() {
    for _ in 0..50 {
        let queue = AsyncQueue::new(3).unwrap();
        let started = Arc::new(Mutex::new(Vec::new()));

        let submitter = queue.clone();
        let order = Arc::clone(&started);
        tokio::spawn(async move {
            for index in 0..6u64 {
                let order = Arc::clone(&order);
                submitter.submit_task(move || {
                    order.lock().unwrap().push(index);
                    async { Ok::<_, ()>(()) }
                });
            }
        })
        .await
        .unwrap();

        queue.idle().await;
        let started = started.lock().unwrap().clone();
        assert_eq!(&started[..3], &[0, 1, 2]);
        assert_eq!(started.len(), 6);
    }
}

/// Full start order holds on a multi-threaded runtime when settle order is
/// forced by spaced durations
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_start_order_on_multi_thread_runtime() {
    let queue = AsyncQueue::new(3).unwrap();
    let started = Arc::new(Mutex::new(Vec::new()));

    for index in 0..6u64 {
        let started = Arc::clone(&started);
        let millis = if index < 3 { 20 * (index + 1) } else { 60 };
        queue.submit_task(move || {
            started.lock().unwrap().push(index);
            async move {
                sleep(Duration::from_millis(millis)).await;
                Ok::<_, ()>(())
            }
        });
    }

    queue.idle().await;
    assert_eq!(*started.lock().unwrap(), (0..6).collect::<Vec<_>>());
}

/// Each task fires exactly one callback exactly once
#[tokio::test]
async fn test_no_callback_double_fire() {
    let queue = AsyncQueue::new(2).unwrap();
    let fired = Arc::new(AtomicUsize::new(0));

    for i in 0..20 {
        let on_ok = Arc::clone(&fired);
        let on_err = Arc::clone(&fired);
        queue.submit(
            move || async move {
                tokio::task::yield_now().await;
                if i % 4 == 0 {
                    Err(i)
                } else {
                    Ok(i)
                }
            },
            Callbacks::new()
                .on_success(move |_| {
                    on_ok.fetch_add(1, Ordering::SeqCst);
                })
                .on_failure(move |_| {
                    on_err.fetch_add(1, Ordering::SeqCst);
                }),
        );
    }

    queue.idle().await;
    assert_eq!(fired.load(Ordering::SeqCst), 20);
    let stats = queue.stats();
    assert_eq!(stats.submitted, 20);
    assert_eq!(stats.settled(), 20);
    assert_eq!(stats.failed, 5);
}

/// The bound holds on a multi-threaded runtime too
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_bounded_on_multi_thread_runtime() {
    let queue = AsyncQueue::new(4).unwrap();
    let running = Arc::new(AtomicUsize::new(0));
    let max_seen = Arc::new(AtomicUsize::new(0));

    for _ in 0..50 {
        let running = Arc::clone(&running);
        let max_seen = Arc::clone(&max_seen);
        queue.submit_task(move || async move {
            let now = running.fetch_add(1, Ordering::SeqCst) + 1;
            max_seen.fetch_max(now, Ordering::SeqCst);
            sleep(Duration::from_millis(1 + rand::random::<u64>() % 5)).await;
            running.fetch_sub(1, Ordering::SeqCst);
            Ok::<_, ()>(())
        });
    }

    queue.idle().await;
    let stats = queue.stats();
    assert!(max_seen.load(Ordering::SeqCst) <= 4);
    assert_eq!(stats.succeeded, 50);
    assert_eq!(stats.available, 4);
    assert_eq!(stats.waiting, 0);
}
