//! # dd-user-sync
//!
//! Org-scoped user-lifecycle batch processor for multi-organization Datadog
//! estates.
//!
//! Uploaded CSV batches (`create_user.csv` / `delete_user.csv`) are parsed
//! into lifecycle records and applied per organization: credentials come from
//! a shared secret document, each record invokes the matching Datadog users
//! API operation, and per-record outcomes are aggregated into a tolerant,
//! partially-succeeding batch result. A separate path reports users whose
//! invitations are still pending across every organization.
//!
//! ## Features
//!
//! - **Partial-failure tolerance**: one bad row or misconfigured org never
//!   aborts the batch; every record gets exactly one reported outcome, in
//!   input order.
//! - **Org-scoped sessions**: one authenticated client per organization,
//!   reused across the batch.
//! - **Bounded retries**: rate limits and 5xx-class errors retry with
//!   exponential backoff; auth and validation rejections fail fast.
//! - **Deadline aware**: when the invocation deadline passes mid-batch, the
//!   remaining records are reported as skipped instead of half-applied.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dd_user_sync::{Settings, UserSync};
//!
//! #[tokio::main]
//! async fn main() -> dd_user_sync::Result<()> {
//!     let sync = UserSync::new(Settings::from_env()?).await?;
//!
//!     let body = std::fs::read("create_user.csv")?;
//!     if let Some(result) = sync.process_upload("create_user.csv", &body).await? {
//!         println!("succeeded: {}", result.counts.succeeded);
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod core;
pub mod utils;

// Re-export main types
pub use crate::config::Settings;
pub use crate::core::action::UserAction;
pub use crate::core::batch::{
    BatchProcessor, BatchResult, OutcomeStatus, RecordError, RecordOutcome,
};
pub use crate::core::datadog::{DatadogConfig, PlatformError, UsersClient};
pub use crate::core::pending::PendingInviteReport;
pub use crate::core::records::{LifecycleRecord, parse_records};
pub use crate::core::secrets::{CredentialDirectory, DirectoryCache, DirectoryError, SecretStore};
pub use crate::utils::error::{Result, SyncError};

use std::sync::Arc;

use tokio::time::Instant;
use tracing::info;

use crate::core::report;

/// One invocation surface over the whole pipeline: secret store, credential
/// cache, parser, orchestrator, reporter.
pub struct UserSync {
    settings: Settings,
    store: Arc<dyn SecretStore>,
    cache: DirectoryCache,
}

impl UserSync {
    /// Create an instance backed by AWS Secrets Manager
    #[cfg(feature = "aws")]
    pub async fn new(settings: Settings) -> Result<Self> {
        let store = Arc::new(crate::core::secrets::SecretsManagerStore::new().await);
        Ok(Self::with_store(settings, store))
    }

    /// Create an instance over any secret store implementation
    pub fn with_store(settings: Settings, store: Arc<dyn SecretStore>) -> Self {
        Self {
            settings,
            store,
            cache: DirectoryCache::new(),
        }
    }

    /// Process one uploaded batch file.
    ///
    /// The action is selected by the object key; keys matching neither batch
    /// pattern are ignored.
    pub async fn process_upload(&self, key: &str, body: &[u8]) -> Result<Option<BatchResult>> {
        let Some(action) = UserAction::from_object_key(key) else {
            info!(key, "Object key matches no batch pattern, ignoring");
            return Ok(None);
        };
        self.process_batch(action, body).await.map(Some)
    }

    /// Parse and process a batch with an explicit action
    pub async fn process_batch(&self, action: UserAction, body: &[u8]) -> Result<BatchResult> {
        let records = parse_records(body, action)?;

        let directory = self
            .cache
            .get_or_load(self.store.as_ref(), &self.settings.secret_name)
            .await;

        let mut processor =
            BatchProcessor::new(directory, DatadogConfig::from_settings(&self.settings))?;
        if let Some(deadline) = self.settings.deadline_duration() {
            processor = processor.with_deadline(Instant::now() + deadline);
        }

        let result = processor.run(action, records).await;
        report::log_batch_result(&result);
        Ok(result)
    }

    /// Collect the pending-invite report across every known organization
    pub async fn pending_report(&self) -> Result<PendingInviteReport> {
        let directory = self
            .cache
            .get_or_load(self.store.as_ref(), &self.settings.secret_name)
            .await;

        let mut processor =
            BatchProcessor::new(directory, DatadogConfig::from_settings(&self.settings))?;
        if let Some(deadline) = self.settings.deadline_duration() {
            processor = processor.with_deadline(Instant::now() + deadline);
        }

        let report = processor.collect_pending().await;
        report::log_pending_report(&report);
        Ok(report)
    }
}

// Version information
/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");
