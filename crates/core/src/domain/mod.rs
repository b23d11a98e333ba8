// Domain Layer - Plain data describing queues and tasks

pub mod error;
pub mod queue;
pub mod task;

// Re-exports
pub use error::TaskOutcomeError;
pub use queue::{QueueConfig, QueueId, QueueStats};
pub use task::{DispatchReceipt, TaskId, TaskState};
