use crate::logging::log_source_operation;
use crate::models::Source;
use crate::state_machine::{PersistenceError, PersistenceResult, StatefulEntity, TransitionPersistence};
use crate::store::MigrationStore;
use async_trait::async_trait;
use std::sync::Arc;

/// Saves the whole source document on every transition and command run
pub struct StorePersistence {
    store: Arc<dyn MigrationStore>,
}

impl StorePersistence {
    pub fn new(store: Arc<dyn MigrationStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl TransitionPersistence<Source> for StorePersistence {
    async fn persist_transition(&self, source: &Source, from: &str, to: &str) -> PersistenceResult<()> {
        self.store
            .save_source(source)
            .await
            .map_err(|error| PersistenceError::TransitionSaveFailed {
                entity: source.label(),
                reason: error.to_string(),
            })?;
        log_source_operation("transition", &source.name, to, Some(from));
        Ok(())
    }

    async fn checkpoint(&self, source: &Source) -> PersistenceResult<()> {
        self.store
            .save_source(source)
            .await
            .map_err(|error| PersistenceError::CheckpointFailed {
                entity: source.label(),
                reason: error.to_string(),
            })
    }
}
