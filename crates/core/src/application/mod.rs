// Application Layer - The queue and its workers

pub mod queue;
pub mod worker;

// Re-exports
pub use queue::AsyncQueue;
pub use worker::Dispatch;
