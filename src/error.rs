//! Crate-wide error type.

use crate::cloud::CloudError;
use crate::config::ConfigurationError;
use crate::mapping::MappingError;
use crate::remote::RemoteError;
use crate::state_machine::{CommandError, LifecycleError, StateMachineError};
use crate::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigratorError {
    #[error("Invalid migration plan: {0}")]
    InvalidPlan(String),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    StateMachine(#[from] StateMachineError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Cloud(#[from] CloudError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Scheduler error: {0}")]
    Scheduler(String),
}

pub type MigratorResult<T> = Result<T, MigratorError>;
