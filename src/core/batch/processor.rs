//! Batch Orchestrator
//!
//! The core control loop: for each record in input order, resolve the
//! organization's credentials, reuse or open the org session, dispatch the
//! lifecycle operation with bounded retry, and classify the outcome. No
//! record failure aborts the batch, and there is no rollback: a partially
//! applied batch is a reported outcome, not an error state.
//!
//! Processing is strictly sequential. That bounds the outbound request rate
//! per organization and keeps per-record error attribution unambiguous.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::time::Instant;
use tracing::{info, warn};

use super::types::{BatchResult, OutcomeCounts, RecordError, RecordOutcome};
use crate::core::action::UserAction;
use crate::core::datadog::{DatadogConfig, UsersClient};
use crate::core::pending::{OrgPendingOutcome, PendingInviteReport};
use crate::core::records::LifecycleRecord;
use crate::core::secrets::{CredentialDirectory, DirectoryError};
use crate::utils::error::Result;
use crate::utils::retry::{RetryConfig, RetryPolicy};

/// Sequential per-record processor for one invocation
pub struct BatchProcessor {
    directory: std::result::Result<Arc<CredentialDirectory>, DirectoryError>,
    platform: DatadogConfig,
    retry: RetryPolicy,
    deadline: Option<Instant>,
    sessions: HashMap<String, Arc<UsersClient>>,
}

impl BatchProcessor {
    /// Create a processor over a resolved (or failed) credential directory.
    ///
    /// A failed directory is carried, not propagated: every record of the
    /// batch then fails with `secret_unavailable` while the batch itself
    /// still produces a complete result.
    pub fn new(
        directory: std::result::Result<Arc<CredentialDirectory>, DirectoryError>,
        platform: DatadogConfig,
    ) -> Result<Self> {
        platform.validate()?;

        Ok(Self {
            directory,
            platform,
            retry: RetryPolicy::new(RetryConfig::default()),
            deadline: None,
            sessions: HashMap::new(),
        })
    }

    /// Settings
    pub fn with_retry(mut self, config: RetryConfig) -> Self {
        self.retry = RetryPolicy::new(config);
        self
    }

    /// Stop issuing calls once the instant passes; remaining records are
    /// reported as skipped
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Process every record in input order and aggregate the outcomes
    pub async fn run(&mut self, action: UserAction, records: Vec<LifecycleRecord>) -> BatchResult {
        let started_at = Utc::now();
        info!(action = %action, total = records.len(), "Batch started");

        let mut outcomes = Vec::with_capacity(records.len());
        for record in records {
            if self.deadline_reached() {
                outcomes.push(RecordOutcome::skipped(
                    record,
                    RecordError::deadline("Invocation deadline reached before dispatch"),
                ));
                continue;
            }
            outcomes.push(self.process_record(action, record).await);
        }

        let counts = OutcomeCounts::tally(&outcomes);
        info!(
            action = %action,
            total = counts.total,
            succeeded = counts.succeeded,
            failed = counts.failed,
            skipped = counts.skipped,
            "Batch finished"
        );

        BatchResult {
            action,
            outcomes,
            counts,
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// Query every known organization for pending invitations.
    ///
    /// An organization whose fetch fails is recorded with an error marker and
    /// does not block the others.
    pub async fn collect_pending(&mut self) -> PendingInviteReport {
        let orgs = match &self.directory {
            Ok(directory) => directory.org_names(),
            Err(err) => {
                warn!("Pending report aborted before any org: {}", err);
                return PendingInviteReport::unavailable(err.to_string());
            }
        };

        let mut report = PendingInviteReport::new();
        for org in orgs {
            if self.deadline_reached() {
                report.insert(org, OrgPendingOutcome::error("Invocation deadline reached"));
                continue;
            }

            let outcome = match self.session_for(&org) {
                Ok(session) => {
                    let (result, _attempts) = self.retry.call(|| session.list_pending()).await;
                    match result {
                        Ok(users) => {
                            info!(org = %org, pending = users.len(), "Pending invites fetched");
                            OrgPendingOutcome::users(users)
                        }
                        Err(err) => {
                            warn!(org = %org, error = %err, "Pending invite fetch failed");
                            OrgPendingOutcome::error(err.to_string())
                        }
                    }
                }
                Err(err) => OrgPendingOutcome::error(err.message),
            };
            report.insert(org, outcome);
        }
        report
    }

    /// Process one record; every failure is captured, never propagated
    async fn process_record(
        &mut self,
        action: UserAction,
        record: LifecycleRecord,
    ) -> RecordOutcome {
        if let Some(reason) = record.invalid.clone() {
            warn!(line = record.line, reason = %reason, "Malformed row");
            return RecordOutcome::failed(record, 0, RecordError::malformed(reason));
        }

        let session = match self.session_for(&record.org) {
            Ok(session) => session,
            Err(error) => {
                warn!(
                    line = record.line,
                    org = %record.org,
                    code = %error.code,
                    "Credential resolution failed"
                );
                return RecordOutcome::failed(record, 0, error);
            }
        };

        let (result, attempts) = match action {
            UserAction::Invite => {
                let role = record.role.as_deref().unwrap_or_default();
                self.retry
                    .call(|| session.invite(&record.name, &record.email, role))
                    .await
            }
            UserAction::Disable => self.retry.call(|| session.disable(&record.email)).await,
        };

        match result {
            Ok(()) => RecordOutcome::succeeded(record, attempts),
            Err(err) => {
                warn!(
                    line = record.line,
                    email = %record.email,
                    attempts,
                    error = %err,
                    "Record failed"
                );
                RecordOutcome::failed(record, attempts, RecordError::from_platform(&err))
            }
        }
    }

    /// Resolve credentials and return the session for an org, opening it on
    /// first use and reusing it for the rest of the batch
    fn session_for(&mut self, org: &str) -> std::result::Result<Arc<UsersClient>, RecordError> {
        if let Some(session) = self.sessions.get(org) {
            return Ok(session.clone());
        }

        let directory = match &self.directory {
            Ok(directory) => directory,
            Err(err) => return Err(RecordError::from_directory(err)),
        };

        let credential = directory
            .resolve(org)
            .map_err(|e| RecordError::from_directory(&e))?
            .clone();

        let session = UsersClient::new(org, credential, self.platform.clone())
            .map(Arc::new)
            .map_err(|e| RecordError::from_platform(&e))?;
        self.sessions.insert(org.to_string(), session.clone());
        Ok(session)
    }

    fn deadline_reached(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}
