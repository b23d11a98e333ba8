// Task Domain Model

use serde::{Deserialize, Serialize};

/// Task ID (submission sequence number, unique per queue)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskId(u64);

impl TaskId {
    pub fn new(seq: u64) -> Self {
        Self(seq)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// Task State
///
/// `Running -> Settled` or `Waiting -> Running -> Settled`; a task never
/// re-enters `Waiting` once it has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    Waiting,
    Running,
    Settled,
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskState::Waiting => write!(f, "WAITING"),
            TaskState::Running => write!(f, "RUNNING"),
            TaskState::Settled => write!(f, "SETTLED"),
        }
    }
}

/// What a submission resolves to once its task has been dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReceipt {
    pub id: TaskId,
    /// `Running` if a slot was free at submission, `Waiting` if it was queued
    pub state_at_submit: TaskState,
}

impl DispatchReceipt {
    pub fn was_queued(&self) -> bool {
        self.state_at_submit == TaskState::Waiting
    }
}
