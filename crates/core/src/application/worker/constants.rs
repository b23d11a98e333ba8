// Queue constants (no magic values)

/// Default number of worker slots
pub const DEFAULT_CONCURRENCY: usize = 3;

/// Default queue name, used in log fields
pub const DEFAULT_QUEUE_NAME: &str = "default";

/// Message recorded when a panic payload is neither `&str` nor `String`
pub const UNKNOWN_PANIC_MESSAGE: &str = "Unknown panic";
