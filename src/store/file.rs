//! One pretty-printed JSON document per source and per run:
//! `<root>/sources/<id>.json` and `<root>/runs/<id>.json`.

use super::{MigrationStore, StoreError, StoreResult};
use crate::models::{MigrationRun, Source};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document_path(&self, kind: &str, id: Uuid) -> PathBuf {
        self.root.join(kind).join(format!("{id}.json"))
    }

    async fn write_document<T: Serialize>(&self, kind: &str, id: Uuid, value: &T) -> StoreResult<()> {
        let path = self.document_path(kind, id);
        let directory = self.root.join(kind);
        tokio::fs::create_dir_all(&directory)
            .await
            .map_err(|e| StoreError::io(&directory, e))?;

        let body = serde_json::to_vec_pretty(value)?;
        // Write beside the document and rename so readers never see a partial file
        let staging = path.with_extension("json.tmp");
        tokio::fs::write(&staging, body)
            .await
            .map_err(|e| StoreError::io(&staging, e))?;
        tokio::fs::rename(&staging, &path)
            .await
            .map_err(|e| StoreError::io(&path, e))?;

        debug!(path = %path.display(), "STORE: Document written");
        Ok(())
    }

    async fn read_document<T: DeserializeOwned>(
        &self,
        kind: &'static str,
        id: Uuid,
        not_found: &'static str,
    ) -> StoreResult<T> {
        let path = self.document_path(kind, id);
        match tokio::fs::read(&path).await {
            Ok(body) => Ok(serde_json::from_slice(&body)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound { kind: not_found, id }),
            Err(e) => Err(StoreError::io(&path, e)),
        }
    }
}

#[async_trait]
impl MigrationStore for FileStore {
    async fn save_source(&self, source: &Source) -> StoreResult<()> {
        self.write_document("sources", source.id, source).await
    }

    async fn load_source(&self, id: Uuid) -> StoreResult<Source> {
        self.read_document("sources", id, "source").await
    }

    async fn sources_for_run(&self, run_id: Uuid) -> StoreResult<Vec<Source>> {
        let directory = self.root.join("sources");
        let mut entries = match tokio::fs::read_dir(&directory).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&directory, e)),
        };

        let mut sources = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::io(&directory, e))?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let body = tokio::fs::read(&path)
                .await
                .map_err(|e| StoreError::io(&path, e))?;
            let source: Source = serde_json::from_slice(&body)?;
            if source.run_id == run_id {
                sources.push(source);
            }
        }

        sources.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(sources)
    }

    async fn save_run(&self, run: &MigrationRun) -> StoreResult<()> {
        self.write_document("runs", run.id, run).await
    }

    async fn load_run(&self, id: Uuid) -> StoreResult<MigrationRun> {
        self.read_document("runs", id, "run").await
    }
}
