//! Result Reporter
//!
//! The invocation's log output is the sole failure signal: outcomes are
//! rendered as structured log lines plus an aggregate summary. The pending
//! report also renders as fixed-width text for the log sink.

use std::fmt::Write;

use tracing::{error, info, warn};

use crate::core::batch::{BatchResult, OutcomeStatus};
use crate::core::pending::PendingInviteReport;

/// Log one line per record outcome and a summary line
pub fn log_batch_result(result: &BatchResult) {
    for outcome in &result.outcomes {
        match outcome.status {
            OutcomeStatus::Succeeded => info!(
                action = %result.action,
                line = outcome.record.line,
                email = %outcome.record.email,
                org = %outcome.record.org,
                attempts = outcome.attempts,
                "Record succeeded"
            ),
            OutcomeStatus::Skipped => warn!(
                line = outcome.record.line,
                email = %outcome.record.email,
                "Record skipped: {}",
                detail(outcome.error.as_ref().map(|e| e.message.as_str()))
            ),
            OutcomeStatus::Failed => error!(
                action = %result.action,
                line = outcome.record.line,
                email = %outcome.record.email,
                org = %outcome.record.org,
                attempts = outcome.attempts,
                code = outcome.error.as_ref().map(|e| e.code.as_str()).unwrap_or("unknown"),
                "Record failed: {}",
                detail(outcome.error.as_ref().map(|e| e.message.as_str()))
            ),
        }
    }

    info!(
        action = %result.action,
        total = result.counts.total,
        succeeded = result.counts.succeeded,
        failed = result.counts.failed,
        skipped = result.counts.skipped,
        "Batch processing completed"
    );
}

/// Fixed-width text rendering of the pending report
pub fn render_pending_report(report: &PendingInviteReport) -> String {
    let mut out = String::from("Invite Pending Users\n");

    if let Some(err) = &report.error {
        let _ = writeln!(out, "credential directory unavailable: {}", err);
        return out;
    }

    for (org, outcome) in &report.orgs {
        let _ = writeln!(out, "=== {} ===", org);
        if let Some(err) = &outcome.error {
            let _ = writeln!(out, "fetch failed: {}", err);
        } else if outcome.users.is_empty() {
            let _ = writeln!(out, "no pending invitations");
        } else {
            for user in &outcome.users {
                let _ = writeln!(
                    out,
                    "{:<35} {:<25} id:{}",
                    user.email,
                    user.name.as_deref().unwrap_or("-"),
                    user.id
                );
            }
        }
    }

    out
}

/// Emit the pending report through the log sink, plus a summary line
pub fn log_pending_report(report: &PendingInviteReport) {
    for line in render_pending_report(report).lines() {
        info!("{}", line);
    }

    info!(
        orgs = report.orgs.len(),
        pending = report.total_pending(),
        failed_orgs = report.failed_orgs(),
        "Pending invite report completed"
    );
}

fn detail(message: Option<&str>) -> &str {
    message.unwrap_or("unknown")
}
