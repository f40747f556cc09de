//! Status enums for results, tracked tasks and workers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Status a worker reports in a result message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Success,
    Failed,
}

impl ResultStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultStatus::Success => "success",
            ResultStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal status of a task as seen by the leader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskOutcome {
    /// A `success` result arrived.
    Succeeded,
    /// A `failed` result arrived.
    Failed,
    /// The deadline passed before any result arrived.
    TimedOut,
}

impl From<ResultStatus> for TaskOutcome {
    fn from(status: ResultStatus) -> Self {
        match status {
            ResultStatus::Success => TaskOutcome::Succeeded,
            ResultStatus::Failed => TaskOutcome::Failed,
        }
    }
}

impl fmt::Display for TaskOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskOutcome::Succeeded => "succeeded",
            TaskOutcome::Failed => "failed",
            TaskOutcome::TimedOut => "timed_out",
        };
        f.write_str(s)
    }
}

/// Per-task state machine of a worker.
///
/// `Idle -> Received -> Processing -> (Succeeded | Failed) -> Idle`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerState {
    #[default]
    Idle,
    Received,
    Processing,
    Succeeded,
    Failed,
}

impl WorkerState {
    /// Returns true if `next` is a legal successor of this state.
    pub fn can_transition_to(&self, next: WorkerState) -> bool {
        use WorkerState::*;
        matches!(
            (self, next),
            (Idle, Received)
                | (Received, Processing)
                | (Processing, Succeeded)
                | (Processing, Failed)
                | (Succeeded, Idle)
                | (Failed, Idle)
        )
    }

    /// Move to `next`, rejecting transitions the state machine forbids.
    pub fn transition(self, next: WorkerState) -> Result<WorkerState, CoreError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CoreError::InvalidStateTransition {
                from: format!("{:?}", self),
                to: format!("{:?}", next),
            })
        }
    }

    /// Returns true while a task is in hand.
    pub fn is_busy(&self) -> bool {
        !matches!(self, WorkerState::Idle)
    }
}
