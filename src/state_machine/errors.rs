use crate::cloud::CloudError;
use crate::mapping::MappingError;
use crate::remote::RemoteError;
use thiserror::Error;

/// Errors raised while querying or building a status lifecycle
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("Status lifecycle must contain at least one status")]
    Empty,

    #[error("Status lifecycle contains duplicate status: {status}")]
    DuplicateStatus { status: String },

    #[error("Invalid status: offset {offset} from '{status}' is outside the lifecycle")]
    InvalidStatus { status: String, offset: isize },

    #[error("Unknown status: '{status}' is not part of the lifecycle")]
    UnknownStatus { status: String },
}

/// Errors raised by a single command
#[derive(Error, Debug)]
pub enum CommandError {
    /// One or more independent sub-operations failed; `report` joins all of them
    #[error("{command} failed with {error_count} error(s):\n{report}")]
    Failed {
        command: String,
        error_count: usize,
        report: String,
    },

    #[error("{command} cannot run: {reason}")]
    Precondition { command: String, reason: String },

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Cloud(#[from] CloudError),

    #[error(transparent)]
    Mapping(#[from] MappingError),
}

impl CommandError {
    pub fn precondition(command: &str, reason: impl Into<String>) -> Self {
        Self::Precondition {
            command: command.to_string(),
            reason: reason.into(),
        }
    }
}

/// Error raised by a lifecycle hook
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct HookError(pub String);

/// Specific error type for persistence operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    #[error("Failed to save transition for {entity}: {reason}")]
    TransitionSaveFailed { entity: String, reason: String },

    #[error("Failed to checkpoint {entity}: {reason}")]
    CheckpointFailed { entity: String, reason: String },
}

/// Comprehensive error type for commander operations
#[derive(Error, Debug)]
pub enum StateMachineError {
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("Command for status '{status}' failed: {source}")]
    CommandFailed {
        status: String,
        #[source]
        source: CommandError,
    },

    #[error("{phase} hook for status '{status}' failed: {source}")]
    HookFailed {
        status: String,
        phase: super::hooks::HookPhase,
        #[source]
        source: HookError,
    },

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl StateMachineError {
    /// Status the entity was at when the failure happened, if known
    pub fn status(&self) -> Option<&str> {
        match self {
            Self::CommandFailed { status, .. } | Self::HookFailed { status, .. } => Some(status),
            _ => None,
        }
    }
}

/// Result type alias for state machine operations
pub type StateMachineResult<T> = Result<T, StateMachineError>;
pub type LifecycleResult<T> = Result<T, LifecycleError>;
pub type CommandResult<T> = Result<T, CommandError>;
pub type PersistenceResult<T> = Result<T, PersistenceError>;
