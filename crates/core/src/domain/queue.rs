// Queue Domain Model

use crate::application::worker::constants::{DEFAULT_CONCURRENCY, DEFAULT_QUEUE_NAME};
use crate::error::{QueueError, Result};
use serde::{Deserialize, Serialize};

/// Queue identifier (used in logs only)
pub type QueueId = String;

/// Queue configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub name: QueueId,
    pub concurrency: usize,
}

impl QueueConfig {
    pub fn new(name: impl Into<String>, concurrency: usize) -> Self {
        Self {
            name: name.into(),
            concurrency,
        }
    }

    /// Reject configurations that would produce a queue that never dispatches
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(QueueError::InvalidConcurrency(self.concurrency));
        }
        if self.name.trim().is_empty() {
            return Err(QueueError::Validation(
                "Queue name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_NAME, DEFAULT_CONCURRENCY)
    }
}

/// Point-in-time snapshot of a queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    /// Configured concurrency limit
    pub limit: usize,
    /// Tasks started but not yet settled
    pub running: usize,
    /// Tasks in the waiting list
    pub waiting: usize,
    /// Free worker slots
    pub available: usize,
    pub submitted: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub panicked: u64,
    /// Tasks dropped unsettled because their runtime shut down
    pub abandoned: u64,
}

impl QueueStats {
    /// Tasks that reached a terminal state
    pub fn settled(&self) -> u64 {
        self.succeeded + self.failed + self.panicked
    }

    pub fn is_idle(&self) -> bool {
        self.running == 0 && self.waiting == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = QueueConfig::default();
        assert_eq!(config.concurrency, 3);
        assert_eq!(config.name, "default");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_concurrency() {
        let config = QueueConfig::new("q", 0);
        assert_eq!(config.validate(), Err(QueueError::InvalidConcurrency(0)));
    }

    #[test]
    fn test_validate_empty_name() {
        let config = QueueConfig::new("  ", 2);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_deserialize_partial_config_uses_defaults() {
        let config: QueueConfig = serde_json::from_str(r#"{"concurrency": 8}"#).unwrap();
        assert_eq!(config, QueueConfig::new("default", 8));
    }

    #[test]
    fn test_stats_settled_and_idle() {
        let stats = QueueStats {
            limit: 3,
            running: 0,
            waiting: 0,
            available: 3,
            submitted: 6,
            succeeded: 4,
            failed: 1,
            panicked: 1,
            abandoned: 0,
        };
        assert_eq!(stats.settled(), 6);
        assert!(stats.is_idle());
    }
}
