use crate::state_machine::REPORT_SEPARATOR;
use thiserror::Error;

/// Errors raised while mapping source devices and paths onto the target
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    /// One or more source devices had no counterpart; nothing was mapped
    #[error("Device identification failed for {} device(s):\n{}", .failures.len(), .failures.join(REPORT_SEPARATOR))]
    Unidentified { failures: Vec<String> },

    #[error("Devices were already identified for this target; the mapping is never recomputed")]
    AlreadyIdentified,

    #[error("Devices have not been identified for this target yet")]
    NotIdentified,

    #[error("No system info recorded for {host}")]
    MissingSystemInfo { host: String },

    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
}

impl MappingError {
    pub fn invalid_path(path: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

pub type MappingResult<T> = Result<T, MappingError>;
