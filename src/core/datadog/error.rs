//! Datadog error classification
//!
//! Rate limits and 5xx-class failures are retryable; auth, validation and
//! not-found rejections are not.

use std::time::Duration;

use serde_json::Value;

use crate::utils::retry::RetryableError;

/// Classified error for one Datadog API operation
#[derive(Debug, Clone, thiserror::Error)]
pub enum PlatformError {
    #[error("Authentication rejected: {message}")]
    Authentication { message: String },

    #[error("Rate limit exceeded: {message}")]
    RateLimit {
        message: String,
        retry_after: Option<u64>,
    },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Timeout: {message}")]
    Timeout { message: String },

    #[error("Failed to parse response: {message}")]
    ResponseParsing { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl PlatformError {
    /// Create authentication error
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Create rate limit error
    pub fn rate_limit(retry_after: Option<u64>) -> Self {
        Self::RateLimit {
            message: match retry_after {
                Some(seconds) => format!("Rate limit exceeded, retry after {}s", seconds),
                None => "Rate limit exceeded".to_string(),
            },
            retry_after,
        }
    }

    /// Create not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create API error with status code
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create timeout error
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Create response parsing error
    pub fn response_parsing(message: impl Into<String>) -> Self {
        Self::ResponseParsing {
            message: message.into(),
        }
    }

    /// Create configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Map an HTTP status and response body to a classified error
    pub fn from_http_status(status: u16, body: &str) -> Self {
        match status {
            400 => Self::invalid_request(format!("Bad request: {}", body)),
            401 => Self::authentication("Invalid or missing API/application key"),
            403 => Self::authentication("Forbidden: insufficient permissions"),
            404 => Self::not_found("Resource not found"),
            429 => Self::rate_limit(extract_retry_after(body)),
            500..=599 => Self::api_error(status, format!("Server error: {}", body)),
            _ => Self::api_error(status, body),
        }
    }
}

impl RetryableError for PlatformError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimit { .. } | Self::Network { .. } | Self::Timeout { .. } => true,

            // API errors depend on status code
            Self::Api { status, .. } => matches!(*status, 500..=599),

            Self::Authentication { .. }
            | Self::NotFound { .. }
            | Self::InvalidRequest { .. }
            | Self::ResponseParsing { .. }
            | Self::Configuration { .. } => false,
        }
    }

    fn retry_delay(&self) -> Option<Duration> {
        match self {
            Self::RateLimit {
                retry_after: Some(seconds),
                ..
            } => Some(Duration::from_secs(*seconds)),
            _ => None,
        }
    }
}

/// Pull a retry-after hint out of a 429 response body
fn extract_retry_after(body: &str) -> Option<u64> {
    let json: Value = serde_json::from_str(body).ok()?;

    if let Some(retry_after) = json.get("retry_after").and_then(Value::as_u64) {
        return Some(retry_after);
    }

    json.pointer("/errors/0/retry_after").and_then(Value::as_u64)
}
