//! # Commands
//!
//! A command is the unit of work bound to one lifecycle status. Commands receive
//! an explicit [`StepErrors`] collector: independent sub-operations record their
//! failures there and carry on, and the commander turns a non-empty collector into
//! a single aggregated [`CommandError::Failed`] once the command body returns.

use super::errors::{CommandError, CommandResult};
use super::lifecycle::LifecycleStatus;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Separator placed between individual sub-errors in an aggregated report
pub const REPORT_SEPARATOR: &str = "\n----------\n";

/// Sentinel a command may return to stop the commander from auto-advancing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// Stay at the current status until an external actor resumes explicitly
    Sleep,
}

/// Per-step collector for non-fatal sub-operation failures
#[derive(Debug, Default, Clone)]
pub struct StepErrors {
    errors: Vec<String>,
}

impl StepErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failed sub-operation
    pub fn record(&mut self, operation: impl fmt::Display, error: impl fmt::Display) {
        let message = format!("{operation}: {error}");
        tracing::warn!(error = %message, "⚠️ STEP: sub-operation failed");
        self.errors.push(message);
    }

    /// Record the error of a failed result and hand back the success value
    pub fn capture<T, E: fmt::Display>(
        &mut self,
        operation: impl fmt::Display,
        result: Result<T, E>,
    ) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.record(operation, error);
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.errors.iter().map(String::as_str)
    }

    /// Human-readable report joining every recorded failure
    pub fn report(&self) -> String {
        self.errors.join(REPORT_SEPARATOR)
    }

    /// Convert the collector into the aggregated command failure, if any
    pub fn into_result(self, command: &str) -> CommandResult<()> {
        if self.errors.is_empty() {
            return Ok(());
        }
        Err(CommandError::Failed {
            command: command.to_string(),
            error_count: self.errors.len(),
            report: self.report(),
        })
    }
}

/// Unit of work bound to one status of an entity's lifecycle
#[async_trait]
pub trait Command<E>: Send + Sync {
    /// Name used in logs and failure reports
    fn name(&self) -> &'static str;

    /// Run the command against the entity.
    ///
    /// Fatal problems are returned directly; independent failures go to `errors`.
    async fn run(&self, entity: &mut E, errors: &mut StepErrors) -> CommandResult<Option<Signal>>;
}

/// Mapping from status to the command that handles it.
///
/// Statuses without an entry are skipped by the commander.
pub struct CommandTable<S: LifecycleStatus, E> {
    commands: HashMap<S, Arc<dyn Command<E>>>,
}

impl<S: LifecycleStatus, E> Default for CommandTable<S, E> {
    fn default() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }
}

impl<S: LifecycleStatus, E> CommandTable<S, E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command, returning any command it overrides
    pub fn insert(
        &mut self,
        status: S,
        command: Arc<dyn Command<E>>,
    ) -> Option<Arc<dyn Command<E>>> {
        self.commands.insert(status, command)
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with(mut self, status: S, command: Arc<dyn Command<E>>) -> Self {
        self.commands.insert(status, command);
        self
    }

    /// Drop the command for a status so that the status becomes a free skip
    pub fn remove(&mut self, status: &S) -> Option<Arc<dyn Command<E>>> {
        self.commands.remove(status)
    }

    pub fn get(&self, status: &S) -> Option<&Arc<dyn Command<E>>> {
        self.commands.get(status)
    }

    pub fn statuses(&self) -> impl Iterator<Item = &S> {
        self.commands.keys()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl<S: LifecycleStatus, E> fmt::Debug for CommandTable<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<(String, &'static str)> = self
            .commands
            .iter()
            .map(|(status, command)| (status.to_string(), command.name()))
            .collect();
        entries.sort();
        f.debug_struct("CommandTable")
            .field("commands", &entries)
            .finish()
    }
}
