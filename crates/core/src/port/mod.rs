// Port Layer - Interfaces for caller-supplied code

pub mod callback;

// Re-exports
pub use callback::{Callbacks, FailureCallback, Settlement, SuccessCallback};
