use super::{MigrationStore, StoreError, StoreResult};
use crate::models::{MigrationRun, Source};
use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

/// Process-local store
#[derive(Debug, Default)]
pub struct MemoryStore {
    sources: DashMap<Uuid, Source>,
    runs: DashMap<Uuid, MigrationRun>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }
}

#[async_trait]
impl MigrationStore for MemoryStore {
    async fn save_source(&self, source: &Source) -> StoreResult<()> {
        self.sources.insert(source.id, source.clone());
        Ok(())
    }

    async fn load_source(&self, id: Uuid) -> StoreResult<Source> {
        self.sources
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(StoreError::NotFound { kind: "source", id })
    }

    async fn sources_for_run(&self, run_id: Uuid) -> StoreResult<Vec<Source>> {
        let mut sources: Vec<Source> = self
            .sources
            .iter()
            .filter(|entry| entry.run_id == run_id)
            .map(|entry| entry.value().clone())
            .collect();
        sources.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(sources)
    }

    async fn save_run(&self, run: &MigrationRun) -> StoreResult<()> {
        self.runs.insert(run.id, run.clone());
        Ok(())
    }

    async fn load_run(&self, id: Uuid) -> StoreResult<MigrationRun> {
        self.runs
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(StoreError::NotFound { kind: "run", id })
    }
}
