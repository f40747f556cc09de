//! Command handlers.
//!
//! Every handler returns an [`Outcome`]; errors are turned into `failed`
//! outcomes by the runtime, never propagated further.

mod lifecycle;
mod manifest;

use std::fmt;
use std::path::Path;

use pluginfleet_core::{Command, ResultStatus};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

/// Errors raised while handling one task.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("Failed to encode result: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Handler panicked: {0}")]
    Panicked(String),
}

/// Status and payload of a handled task.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub status: ResultStatus,
    pub result: Value,
}

impl Outcome {
    /// `success` iff `passed`.
    pub fn verdict<T: Serialize>(passed: bool, body: &T) -> Result<Self, HandlerError> {
        let status = if passed {
            ResultStatus::Success
        } else {
            ResultStatus::Failed
        };
        Ok(Self {
            status,
            result: serde_json::to_value(body)?,
        })
    }

    /// The handler ran to completion; its payload says how it went.
    pub fn completed<T: Serialize>(body: &T) -> Result<Self, HandlerError> {
        Self::verdict(true, body)
    }

    /// `failed` with `{"error": <text>}`.
    pub fn failed(error: &impl fmt::Display) -> Self {
        Self {
            status: ResultStatus::Failed,
            result: json!({ "error": error.to_string() }),
        }
    }
}

/// Run `command`, resolving relative plugin paths against `root`.
pub async fn dispatch(command: Command, root: &Path) -> Result<Outcome, HandlerError> {
    match command {
        Command::Lifecycle(cmd) => lifecycle::handle(cmd, root).await,
        Command::Manifest(cmd) => manifest::handle(cmd, root).await,
    }
}

/// Run filesystem-bound work off the async workers.
async fn blocking<T, F>(work: F) -> Result<T, HandlerError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| HandlerError::Panicked(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_outcome_carries_error_text() {
        let outcome = Outcome::failed(&"Unknown command: frobnicate");
        assert_eq!(outcome.status, ResultStatus::Failed);
        assert_eq!(outcome.result["error"], "Unknown command: frobnicate");
    }

    #[tokio::test]
    async fn test_panic_in_blocking_work_is_an_error() {
        let result: Result<(), _> = blocking(|| panic!("boom")).await;
        assert!(matches!(result, Err(HandlerError::Panicked(_))));
    }
}
