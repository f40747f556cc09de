//! Core domain errors.

use thiserror::Error;

/// Core domain errors for PluginFleet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Role name outside the fixed worker roles.
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// Command name outside a role's vocabulary.
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// A command was sent without one of its required parameters.
    #[error("Missing parameter '{param}' for command '{command}'")]
    MissingParameter { command: String, param: String },

    /// A parameter was present but not acceptable.
    #[error("Invalid value '{value}' for parameter '{param}'")]
    InvalidParameter { param: String, value: String },

    /// Invalid state transition.
    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },
}
