//! Runner configuration
//!
//! Layering (lowest to highest): built-in defaults, optional config file,
//! `TASKGATE_*` environment variables, command-line flags.
//!
//! ```text
//! TASKGATE_QUEUE__CONCURRENCY=5 \
//! TASKGATE_WORKLOAD__TASKS=20 \
//!     ./taskgate
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use taskgate_core::QueueConfig;

/// Environment variable prefix for layered config
pub const ENV_PREFIX: &str = "TASKGATE";

/// Synthetic workload settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WorkloadConfig {
    /// Number of tasks to submit
    pub tasks: usize,
    /// Base task duration
    pub duration_ms: u64,
    /// Extra random duration in `0..=jitter_ms`
    pub jitter_ms: u64,
    /// Every k-th task (1-based) fails; 0 disables failures
    pub fail_every: usize,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            tasks: 10,
            duration_ms: 100,
            jitter_ms: 0,
            fail_every: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub queue: QueueConfig,
    pub workload: WorkloadConfig,
}

impl RunnerConfig {
    /// Load defaults, then `file` (if given), then the environment
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: RunnerConfig = builder
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Failed to parse configuration")?;
        Ok(config)
    }
}
