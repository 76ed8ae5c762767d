//! # State Machine
//!
//! Generic, status-driven execution: an ordered [`StatusLifecycle`], the
//! [`Command`] bound to each status, and the [`Commander`] that walks an entity
//! through its lifecycle with pause/resume semantics.

pub mod command;
pub mod commander;
pub mod errors;
pub mod hooks;
pub mod lifecycle;
pub mod persistence;

pub use command::{Command, CommandTable, Signal, StepErrors, REPORT_SEPARATOR};
pub use commander::{Commander, ExecutionOutcome, StatefulEntity};
pub use errors::{
    CommandError, CommandResult, HookError, LifecycleError, LifecycleResult, PersistenceError,
    PersistenceResult, StateMachineError, StateMachineResult,
};
pub use hooks::{HookPhase, HookRunner, NoopHooks};
pub use lifecycle::{LifecycleStatus, StatusLifecycle};
pub use persistence::{NoopPersistence, TransitionPersistence};
