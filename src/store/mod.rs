//! # Migration Store
//!
//! Persistence of sources and runs. The commander saves a source after every
//! status transition and every command run, so a restarted process resumes
//! from the last recorded status.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::config::{StoreBackend, StoreConfig};
use crate::models::{MigrationRun, Source};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: Uuid },

    #[error("Store I/O failed for {path}: {error}")]
    Io { path: String, error: String },

    #[error("Store serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn io(path: &std::path::Path, error: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait MigrationStore: Send + Sync {
    async fn save_source(&self, source: &Source) -> StoreResult<()>;

    async fn load_source(&self, id: Uuid) -> StoreResult<Source>;

    /// Sources of a run, ordered by name
    async fn sources_for_run(&self, run_id: Uuid) -> StoreResult<Vec<Source>>;

    async fn save_run(&self, run: &MigrationRun) -> StoreResult<()>;

    async fn load_run(&self, id: Uuid) -> StoreResult<MigrationRun>;
}

/// Build the store selected in configuration
pub fn from_config(config: &StoreConfig) -> Arc<dyn MigrationStore> {
    match config.backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::File => Arc::new(FileStore::new(config.directory.clone())),
    }
}
