use std::time::Duration;
use thiserror::Error;

/// Cloud provider and adapter errors
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Invalid cloud settings: {0}")]
    InvalidCloudSettings(String),

    #[error("Unsupported cloud provider: {0}")]
    UnsupportedProvider(String),

    /// The provider did not reach the expected state within the wait budget
    #[error("Timed out after {waited:?} waiting for {operation}")]
    CloudConnection { operation: String, waited: Duration },

    #[error("Provider request {request_id} for {operation} failed: {message}")]
    RequestFailed {
        operation: String,
        request_id: String,
        message: String,
    },

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid response: {field} - {reason}")]
    InvalidResponse { field: String, reason: String },
}

impl CloudError {
    pub fn invalid_response(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

pub type CloudResult<T> = Result<T, CloudError>;
