//! Reqguard error types.
//!
//! Request-level rejections (schema failures, threat findings, over-limit
//! payloads) are not errors: they are ordinary pipeline outcomes and live in
//! [`crate::pipeline`]. `GuardError` covers failures of the machinery
//! itself: bad configuration, invalid schema construction, I/O.

use thiserror::Error;

/// Reqguard errors.
#[derive(Error, Debug)]
pub enum GuardError {
    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// A schema could not be constructed (e.g. an invalid pattern constraint).
    #[error("Schema error: {0}")]
    Schema(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for reqguard operations
pub type Result<T> = std::result::Result<T, GuardError>;

impl From<toml::de::Error> for GuardError {
    fn from(err: toml::de::Error) -> Self {
        GuardError::Config(err.to_string())
    }
}

impl From<regex::Error> for GuardError {
    fn from(err: regex::Error) -> Self {
        GuardError::Schema(format!("invalid pattern constraint: {err}"))
    }
}
