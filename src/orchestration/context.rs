use crate::cloud::CloudAdapter;
use crate::remote::RemoteExecutor;
use std::fmt;
use std::sync::Arc;

/// Collaborators shared by every migration command
#[derive(Clone)]
pub struct MigrationContext {
    pub executor: Arc<dyn RemoteExecutor>,
    pub cloud: Arc<CloudAdapter>,
}

impl MigrationContext {
    pub fn new(executor: Arc<dyn RemoteExecutor>, cloud: Arc<CloudAdapter>) -> Arc<Self> {
        Arc::new(Self { executor, cloud })
    }
}

impl fmt::Debug for MigrationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationContext")
            .field("cloud", &self.cloud.provider())
            .finish()
    }
}
