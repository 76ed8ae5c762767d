use thiserror::Error;

/// Failures of commands run on remote hosts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The command ran and exited non-zero
    #[error("Command failed on {host} with exit code {exit_code}: {command}\n{stderr}")]
    Execution {
        host: String,
        command: String,
        exit_code: i32,
        stdout: String,
        stderr: String,
    },

    /// The host could not be reached; every retry was used up
    #[error("Could not connect to {host} after {attempts} attempt(s): {reason}")]
    Connection {
        host: String,
        attempts: u32,
        reason: String,
    },
}

impl RemoteError {
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;
