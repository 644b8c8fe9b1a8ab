//! Pending invitation reporting
//!
//! Recomputed fresh on every invocation; no persisted state.

use std::collections::BTreeMap;

use serde::Serialize;

/// A user whose invitation has not been accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingUser {
    pub id: String,
    pub name: Option<String>,
    pub email: String,
}

/// Pending users for one organization, or the error that prevented the fetch
#[derive(Debug, Clone, Serialize)]
pub struct OrgPendingOutcome {
    pub users: Vec<PendingUser>,
    pub error: Option<String>,
}

impl OrgPendingOutcome {
    /// Successful fetch
    pub fn users(users: Vec<PendingUser>) -> Self {
        Self { users, error: None }
    }

    /// Failed fetch; the error marker replaces the user list
    pub fn error(detail: impl Into<String>) -> Self {
        Self {
            users: Vec::new(),
            error: Some(detail.into()),
        }
    }

    pub fn is_err(&self) -> bool {
        self.error.is_some()
    }
}

/// Per-organization pending invitations
#[derive(Debug, Clone, Default, Serialize)]
pub struct PendingInviteReport {
    /// Outcomes keyed by organization name, in sorted order
    pub orgs: BTreeMap<String, OrgPendingOutcome>,
    /// Set when the credential directory itself could not be loaded
    pub error: Option<String>,
}

impl PendingInviteReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report carrying only the directory-level failure
    pub fn unavailable(detail: impl Into<String>) -> Self {
        Self {
            orgs: BTreeMap::new(),
            error: Some(detail.into()),
        }
    }

    pub fn insert(&mut self, org: impl Into<String>, outcome: OrgPendingOutcome) {
        self.orgs.insert(org.into(), outcome);
    }

    /// Total pending users across organizations
    pub fn total_pending(&self) -> usize {
        self.orgs.values().map(|o| o.users.len()).sum()
    }

    /// Count of organizations whose fetch failed
    pub fn failed_orgs(&self) -> usize {
        self.orgs.values().filter(|o| o.is_err()).count()
    }
}
