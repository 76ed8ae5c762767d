use super::errors::PersistenceResult;
use async_trait::async_trait;

/// Trait for persisting entity progress as the commander drives it
#[async_trait]
pub trait TransitionPersistence<E>: Send + Sync {
    /// Persist a status transition; the entity already carries the new status
    async fn persist_transition(&self, entity: &E, from: &str, to: &str) -> PersistenceResult<()>;

    /// Persist side effects of a command run without a status change
    async fn checkpoint(&self, entity: &E) -> PersistenceResult<()>;
}

/// Persistence that keeps nothing; useful for dry runs and tests
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPersistence;

#[async_trait]
impl<E: Sync> TransitionPersistence<E> for NoopPersistence {
    async fn persist_transition(&self, _entity: &E, _from: &str, _to: &str) -> PersistenceResult<()> {
        Ok(())
    }

    async fn checkpoint(&self, _entity: &E) -> PersistenceResult<()> {
        Ok(())
    }
}
