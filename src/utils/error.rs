//! Error handling for the sync processor
//!
//! This module defines the top-level error type. Only an unreadable batch
//! file and a failed secret fetch abort an invocation before a batch result
//! exists; every other failure is captured per record.

use thiserror::Error;

use crate::core::datadog::PlatformError;
use crate::core::secrets::DirectoryError;

/// Result type alias for the sync processor
pub type Result<T> = std::result::Result<T, SyncError>;

/// Main error type for the sync processor
#[derive(Error, Debug)]
pub enum SyncError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Structurally unreadable batch input (fatal for the invocation)
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Secret document could not be fetched or parsed
    #[error("Secret unavailable: {0}")]
    SecretUnavailable(String),

    /// HTTP client errors
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Downstream platform errors
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),
}

impl From<DirectoryError> for SyncError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::SecretUnavailable { detail } => SyncError::SecretUnavailable(detail),
            DirectoryError::OrgNotFound { org } => {
                SyncError::Config(format!("Unknown organization: {}", org))
            }
        }
    }
}
