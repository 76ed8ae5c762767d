use super::errors::HookError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// When a hook fires relative to its command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookPhase {
    Before,
    After,
}

impl HookPhase {
    /// Event name for a status, e.g. `before_sync`
    pub fn event_name(&self, status: &str) -> String {
        format!("{self}_{status}")
    }
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Before => write!(f, "before"),
            Self::After => write!(f, "after"),
        }
    }
}

/// Hooks emitted by the commander around each command
#[async_trait]
pub trait HookRunner<E>: Send + Sync {
    async fn run_hooks(&self, entity: &E, status: &str, phase: HookPhase) -> Result<(), HookError>;
}

/// Hook runner that does nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHooks;

#[async_trait]
impl<E: Sync> HookRunner<E> for NoopHooks {
    async fn run_hooks(&self, _entity: &E, _status: &str, _phase: HookPhase) -> Result<(), HookError> {
        Ok(())
    }
}
