// Taskgate Core - Bounded-concurrency FIFO task queue
// NO CLI, config loading or subscriber setup here (see taskgate-runner)

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use application::{AsyncQueue, Dispatch};
pub use domain::{DispatchReceipt, QueueConfig, QueueStats, TaskId, TaskOutcomeError, TaskState};
pub use error::{QueueError, Result};
pub use port::Callbacks;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
