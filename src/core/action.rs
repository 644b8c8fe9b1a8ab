//! Batch action selection
//!
//! The action applies to every row of an uploaded file and is selected by the
//! filename pattern of the triggering object, not per row.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Lifecycle operation applied to every record of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum UserAction {
    /// Create the user and send an invitation email
    Invite,
    /// Disable the user account
    Disable,
}

impl UserAction {
    /// Map an uploaded object key to the batch action.
    ///
    /// `create_user.csv` selects Invite and `delete_user.csv` selects
    /// Disable; any other key is ignored by the processor.
    pub fn from_object_key(key: &str) -> Option<Self> {
        if key.ends_with("create_user.csv") {
            Some(Self::Invite)
        } else if key.ends_with("delete_user.csv") {
            Some(Self::Disable)
        } else {
            None
        }
    }

    /// Short label used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invite => "invite",
            Self::Disable => "disable",
        }
    }
}

impl std::fmt::Display for UserAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
