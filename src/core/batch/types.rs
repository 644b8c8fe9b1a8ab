//! Batch outcome types and data structures

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::action::UserAction;
use crate::core::datadog::PlatformError;
use crate::core::records::LifecycleRecord;
use crate::core::secrets::DirectoryError;

/// Error codes attached to failed record outcomes
pub mod codes {
    pub const MALFORMED_INPUT: &str = "malformed_input";
    pub const ORG_NOT_FOUND: &str = "org_not_found";
    pub const SECRET_UNAVAILABLE: &str = "secret_unavailable";
    pub const AUTH_REJECTED: &str = "auth_rejected";
    pub const VALIDATION_REJECTED: &str = "validation_rejected";
    pub const NOT_FOUND: &str = "not_found";
    pub const RATE_LIMITED: &str = "rate_limited";
    pub const UPSTREAM_ERROR: &str = "upstream_error";
    pub const DEADLINE_EXCEEDED: &str = "deadline_exceeded";
}

/// Processing status of a single record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OutcomeStatus {
    /// Operation applied downstream
    Succeeded,
    /// Record not attempted (invocation deadline reached)
    Skipped,
    /// Operation failed; detail in the attached error
    Failed,
}

/// Classified failure attached to a record outcome
#[derive(Debug, Clone, Serialize)]
pub struct RecordError {
    /// Stable error code
    pub code: String,
    /// Human-readable detail
    pub message: String,
}

impl RecordError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }

    /// Row-level parse failure
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(codes::MALFORMED_INPUT, message)
    }

    /// Invocation deadline reached before dispatch
    pub fn deadline(message: impl Into<String>) -> Self {
        Self::new(codes::DEADLINE_EXCEEDED, message)
    }

    /// Classify a credential resolution failure
    pub fn from_directory(err: &DirectoryError) -> Self {
        match err {
            DirectoryError::OrgNotFound { .. } => Self::new(codes::ORG_NOT_FOUND, err.to_string()),
            DirectoryError::SecretUnavailable { .. } => {
                Self::new(codes::SECRET_UNAVAILABLE, err.to_string())
            }
        }
    }

    /// Classify a downstream platform failure
    pub fn from_platform(err: &PlatformError) -> Self {
        let code = match err {
            PlatformError::Authentication { .. } => codes::AUTH_REJECTED,
            PlatformError::InvalidRequest { .. } => codes::VALIDATION_REJECTED,
            PlatformError::NotFound { .. } => codes::NOT_FOUND,
            PlatformError::RateLimit { .. } => codes::RATE_LIMITED,
            PlatformError::Api { .. }
            | PlatformError::Network { .. }
            | PlatformError::Timeout { .. }
            | PlatformError::ResponseParsing { .. }
            | PlatformError::Configuration { .. } => codes::UPSTREAM_ERROR,
        };
        Self::new(code, err.to_string())
    }
}

/// One outcome per input record, in input order; never mutated after creation
#[derive(Debug, Clone, Serialize)]
pub struct RecordOutcome {
    pub record: LifecycleRecord,
    pub status: OutcomeStatus,
    /// Outbound attempts made for this record (0 when none was issued)
    pub attempts: u32,
    pub error: Option<RecordError>,
}

impl RecordOutcome {
    pub(crate) fn succeeded(record: LifecycleRecord, attempts: u32) -> Self {
        Self {
            record,
            status: OutcomeStatus::Succeeded,
            attempts,
            error: None,
        }
    }

    pub(crate) fn failed(record: LifecycleRecord, attempts: u32, error: RecordError) -> Self {
        Self {
            record,
            status: OutcomeStatus::Failed,
            attempts,
            error: Some(error),
        }
    }

    pub(crate) fn skipped(record: LifecycleRecord, error: RecordError) -> Self {
        Self {
            record,
            status: OutcomeStatus::Skipped,
            attempts: 0,
            error: Some(error),
        }
    }
}

/// Aggregate counts for a batch
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct OutcomeCounts {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl OutcomeCounts {
    /// Tally outcomes into aggregate counts
    pub fn tally(outcomes: &[RecordOutcome]) -> Self {
        let mut counts = Self {
            total: outcomes.len(),
            ..Default::default()
        };
        for outcome in outcomes {
            match outcome.status {
                OutcomeStatus::Succeeded => counts.succeeded += 1,
                OutcomeStatus::Failed => counts.failed += 1,
                OutcomeStatus::Skipped => counts.skipped += 1,
            }
        }
        counts
    }
}

/// Immutable result of one batch invocation
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub action: UserAction,
    pub outcomes: Vec<RecordOutcome>,
    pub counts: OutcomeCounts,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}
