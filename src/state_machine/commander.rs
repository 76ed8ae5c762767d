//! # Commander
//!
//! Drives an entity through its [`StatusLifecycle`]: looks up the command mapped to
//! the current status, runs it between before/after hooks, then advances one
//! status and repeats. It stops at the terminal status, when a command returns
//! [`Signal::Sleep`], or when a command fails. Statuses with no mapped command are
//! skipped without side effects.
//!
//! A sleeping entity is marked paused. Executing it again is a no-op until it is
//! advanced with [`Commander::increment_status_and_execute`] or its status is
//! re-run with [`Commander::repeat_status_and_execute`].

use super::command::{Command, CommandTable, Signal, StepErrors};
use super::errors::{LifecycleError, StateMachineError, StateMachineResult};
use super::hooks::{HookPhase, HookRunner, NoopHooks};
use super::lifecycle::{LifecycleStatus, StatusLifecycle};
use super::persistence::{NoopPersistence, TransitionPersistence};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// An entity whose progress is tracked by a lifecycle status
pub trait StatefulEntity: Send + Sync {
    type Status: LifecycleStatus;

    fn status(&self) -> &Self::Status;

    fn set_status(&mut self, status: Self::Status);

    /// Whether the command at the current status returned [`Signal::Sleep`]
    fn is_paused(&self) -> bool;

    fn set_paused(&mut self, paused: bool);

    /// Short identifier used in logs
    fn label(&self) -> String;
}

/// Where a commander run stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome<S> {
    /// A command returned [`Signal::Sleep`] at this status
    Paused(S),
    /// The terminal status was reached and its command (if any) ran
    Completed(S),
}

impl<S> ExecutionOutcome<S> {
    pub fn status(&self) -> &S {
        match self {
            Self::Paused(status) | Self::Completed(status) => status,
        }
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, Self::Paused(_))
    }
}

/// Generic lifecycle executor with pause/resume semantics
pub struct Commander<E: StatefulEntity> {
    lifecycle: Arc<StatusLifecycle<E::Status>>,
    commands: Arc<CommandTable<E::Status, E>>,
    hooks: Arc<dyn HookRunner<E>>,
    persistence: Arc<dyn TransitionPersistence<E>>,
}

impl<E: StatefulEntity + 'static> Commander<E> {
    /// Create a commander; every status in the command table must belong to the lifecycle
    pub fn new(
        lifecycle: StatusLifecycle<E::Status>,
        commands: CommandTable<E::Status, E>,
    ) -> StateMachineResult<Self> {
        if let Some(unknown) = commands.statuses().find(|status| !lifecycle.contains(status)) {
            return Err(LifecycleError::UnknownStatus {
                status: unknown.to_string(),
            }
            .into());
        }

        Ok(Self {
            lifecycle: Arc::new(lifecycle),
            commands: Arc::new(commands),
            hooks: Arc::new(NoopHooks),
            persistence: Arc::new(NoopPersistence),
        })
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn HookRunner<E>>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_persistence(mut self, persistence: Arc<dyn TransitionPersistence<E>>) -> Self {
        self.persistence = persistence;
        self
    }

    pub fn lifecycle(&self) -> &StatusLifecycle<E::Status> {
        &self.lifecycle
    }

    pub fn commands(&self) -> &CommandTable<E::Status, E> {
        &self.commands
    }

    /// Run commands from the entity's current status until it pauses, completes or fails
    #[instrument(skip_all, fields(entity = %entity.label()))]
    pub async fn execute(&self, entity: &mut E) -> StateMachineResult<ExecutionOutcome<E::Status>> {
        if entity.is_paused() {
            let current = entity.status().clone();
            self.lifecycle.position(&current)?;
            debug!(status = %current, "COMMANDER: Already paused, nothing to execute");
            return Ok(ExecutionOutcome::Paused(current));
        }

        loop {
            let current = entity.status().clone();
            self.lifecycle.position(&current)?;

            if let Some(command) = self.commands.get(&current).cloned() {
                let signal = self.run_command(command.as_ref(), entity, &current).await?;
                if signal == Some(Signal::Sleep) {
                    info!(status = %current, "⏸️ COMMANDER: Paused until resumed explicitly");
                    return Ok(ExecutionOutcome::Paused(current));
                }
            } else {
                debug!(status = %current, "COMMANDER: No command mapped, skipping");
            }

            if self.lifecycle.is_terminal(&current) {
                info!(status = %current, "🎉 COMMANDER: Terminal status reached");
                return Ok(ExecutionOutcome::Completed(current));
            }

            self.advance(entity).await?;
        }
    }

    /// Explicit resume: advance one status, then continue with [`execute`](Self::execute).
    ///
    /// Also used by operators to skip a failed status.
    pub async fn increment_status_and_execute(
        &self,
        entity: &mut E,
    ) -> StateMachineResult<ExecutionOutcome<E::Status>> {
        self.advance(entity).await?;
        self.execute(entity).await
    }

    /// Clear the pause and run the current status again, then continue with
    /// [`execute`](Self::execute)
    pub async fn repeat_status_and_execute(
        &self,
        entity: &mut E,
    ) -> StateMachineResult<ExecutionOutcome<E::Status>> {
        entity.set_paused(false);
        self.execute(entity).await
    }

    async fn advance(&self, entity: &mut E) -> StateMachineResult<E::Status> {
        let from = entity.status().clone();
        let was_paused = entity.is_paused();
        let to = self.lifecycle.next(&from)?;
        entity.set_status(to.clone());
        entity.set_paused(false);

        if let Err(error) = self
            .persistence
            .persist_transition(entity, &from.to_string(), &to.to_string())
            .await
        {
            entity.set_status(from);
            entity.set_paused(was_paused);
            return Err(error.into());
        }

        debug!(from = %from, to = %to, "COMMANDER: Status advanced");
        Ok(to)
    }

    async fn run_command(
        &self,
        command: &dyn Command<E>,
        entity: &mut E,
        status: &E::Status,
    ) -> StateMachineResult<Option<Signal>> {
        let status_name = status.to_string();
        self.emit_hooks(entity, &status_name, HookPhase::Before)
            .await?;

        info!(
            command = command.name(),
            status = %status_name,
            "🚀 COMMANDER: Executing command"
        );

        let mut errors = StepErrors::new();
        let outcome = command.run(entity, &mut errors).await;
        if errors.is_empty() && matches!(outcome, Ok(Some(Signal::Sleep))) {
            entity.set_paused(true);
        }

        if let Err(error) = self.persistence.checkpoint(entity).await {
            if outcome.is_ok() && errors.is_empty() {
                return Err(error.into());
            }
            warn!(error = %error, "⚠️ COMMANDER: Checkpoint after failed command did not persist");
        }

        let signal = match outcome {
            Ok(signal) => errors.into_result(command.name()).map(|()| signal),
            Err(fatal) if errors.is_empty() => Err(fatal),
            Err(fatal) => {
                errors.record("aborted", fatal);
                errors.into_result(command.name()).map(|()| None)
            }
        }
        .map_err(|source| {
            warn!(
                command = command.name(),
                status = %status_name,
                error = %source,
                "❌ COMMANDER: Command failed, status not advanced"
            );
            StateMachineError::CommandFailed {
                status: status_name.clone(),
                source,
            }
        })?;

        info!(command = command.name(), status = %status_name, "✅ COMMANDER: Command completed");

        if let Err(error) = self.emit_hooks(entity, &status_name, HookPhase::After).await {
            // Not paused until the after hooks pass
            entity.set_paused(false);
            return Err(error);
        }
        Ok(signal)
    }

    async fn emit_hooks(&self, entity: &E, status: &str, phase: HookPhase) -> StateMachineResult<()> {
        self.hooks
            .run_hooks(entity, status, phase)
            .await
            .map_err(|source| StateMachineError::HookFailed {
                status: status.to_string(),
                phase,
                source,
            })
    }
}

impl<E: StatefulEntity> fmt::Debug for Commander<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Commander")
            .field("lifecycle", &self.lifecycle)
            .field("commands", &self.commands)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::errors::CommandResult;
    use async_trait::async_trait;

    #[derive(Debug)]
    struct Host {
        status: &'static str,
        paused: bool,
        visits: Vec<&'static str>,
    }

    impl StatefulEntity for Host {
        type Status = &'static str;

        fn status(&self) -> &&'static str {
            &self.status
        }

        fn set_status(&mut self, status: &'static str) {
            self.status = status;
        }

        fn is_paused(&self) -> bool {
            self.paused
        }

        fn set_paused(&mut self, paused: bool) {
            self.paused = paused;
        }

        fn label(&self) -> String {
            "host".to_string()
        }
    }

    struct Visit;

    #[async_trait]
    impl Command<Host> for Visit {
        fn name(&self) -> &'static str {
            "Visit"
        }

        async fn run(&self, host: &mut Host, _errors: &mut StepErrors) -> CommandResult<Option<Signal>> {
            host.visits.push(host.status);
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_unknown_command_status_is_rejected() {
        let lifecycle = StatusLifecycle::new(["a", "b"]).unwrap();
        let table = CommandTable::new().with("z", Arc::new(Visit) as Arc<dyn Command<Host>>);
        assert!(Commander::new(lifecycle, table).is_err());
    }

    #[tokio::test]
    async fn test_terminal_command_runs_once() {
        let lifecycle = StatusLifecycle::new(["a", "b"]).unwrap();
        let table = CommandTable::new().with("b", Arc::new(Visit) as Arc<dyn Command<Host>>);
        let commander = Commander::new(lifecycle, table).unwrap();
        let mut host = Host {
            status: "a",
            paused: false,
            visits: Vec::new(),
        };

        let outcome = commander.execute(&mut host).await.unwrap();
        assert_eq!(outcome, ExecutionOutcome::Completed("b"));
        assert_eq!(host.visits, vec!["b"]);
        assert!(commander.increment_status_and_execute(&mut host).await.is_err());
        assert_eq!(host.status, "b");
    }
}
