use super::errors::RemoteResult;
use crate::models::RemoteHost;
use async_trait::async_trait;

/// Per-call execution options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecOptions {
    /// Turn a non-zero exit into [`RemoteError::Execution`](super::RemoteError::Execution);
    /// otherwise stdout is returned regardless of the exit code
    pub raise_on_failure: bool,
    /// Wait for the command to finish; when false the command is detached and
    /// an empty string is returned
    pub block_for_response: bool,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            raise_on_failure: true,
            block_for_response: true,
        }
    }
}

impl ExecOptions {
    pub fn lenient() -> Self {
        Self {
            raise_on_failure: false,
            ..Self::default()
        }
    }

    pub fn detached() -> Self {
        Self {
            block_for_response: false,
            ..Self::default()
        }
    }
}

/// Runs shell commands on remote hosts
#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    /// Run `command` on `host` and return its stdout
    async fn execute(
        &self,
        host: &RemoteHost,
        command: &str,
        options: ExecOptions,
    ) -> RemoteResult<String>;

    /// [`execute`](Self::execute) with default options
    async fn run(&self, host: &RemoteHost, command: &str) -> RemoteResult<String> {
        self.execute(host, command, ExecOptions::default()).await
    }
}
