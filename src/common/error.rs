//! Error types for the conformance runner
//!
//! Errors are grouped by the stage that raises them. Transport errors and
//! load errors are scoped to a single test case and end up inside an
//! [`Outcome`](crate::testing::Outcome); only encode errors abort a run.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the conformance runner
#[derive(Error, Debug)]
pub enum Error {
    // === Case Loading Errors ===
    #[error("Test case source not found: {0}")]
    SourceNotFound(String),

    #[error("Invalid test case '{name}': {reason}")]
    Load { name: String, reason: String },

    // === Transport Errors ===
    #[error("Status {status} - {message}")]
    Status { status: u16, message: String },

    #[error("Could not open a connection to {url}, is the service running? ({reason})")]
    Connection { url: String, reason: String },

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Failed to read response body: {0}")]
    ResponseBody(String),

    // === Request Encoding Errors ===
    #[error("Failed to encode request: {0}")]
    Encode(String),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === Run Errors ===
    #[error("{failed} of {total} test cases failed")]
    SuiteFailed { failed: usize, total: usize },

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a load error for a named test case
    pub fn load<S: Into<String>>(name: &str, reason: S) -> Self {
        Self::Load {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// Create a status error from an HTTP response status
    pub fn status(status: u16, message: &str) -> Self {
        Self::Status {
            status,
            message: message.to_string(),
        }
    }

    /// Create a connection error for an endpoint
    pub fn connection(url: &str, reason: &str) -> Self {
        Self::Connection {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether the endpoint could not be reached or refused the request
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Status { .. }
                | Error::Connection { .. }
                | Error::Timeout { .. }
                | Error::ResponseBody(_)
        )
    }

    /// Whether the error breaks the runner's own invariants and must stop the run
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Encode(_) | Error::Internal(_))
    }
}
