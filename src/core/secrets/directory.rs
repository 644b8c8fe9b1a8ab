//! Credential Directory
//!
//! Process-wide mapping of organization name to API credential pair. The
//! directory is built whole from one secret document parse; it is never
//! partially populated.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Deserialize;
use tracing::{info, warn};

use super::store::SecretStore;

/// API credential pair for one organization
#[derive(Clone, Deserialize)]
pub struct OrgCredential {
    #[serde(rename = "apiKey")]
    pub api_key: String,
    #[serde(rename = "appKey")]
    pub app_key: String,
}

impl std::fmt::Debug for OrgCredential {
    // Key material never reaches logs
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrgCredential")
            .field("api_key", &"[REDACTED]")
            .field("app_key", &"[REDACTED]")
            .finish()
    }
}

/// Errors from credential resolution
#[derive(Debug, Clone, thiserror::Error)]
pub enum DirectoryError {
    /// Organization absent from the secret document (record-scoped)
    #[error("Unknown organization: {org}")]
    OrgNotFound { org: String },

    /// Secret document could not be fetched or parsed
    #[error("Secret store unavailable: {detail}")]
    SecretUnavailable { detail: String },
}

/// Secret document schema: `{"orgs": {"<name>": {"keys": {...}}}}`
#[derive(Deserialize)]
struct SecretDocument {
    orgs: HashMap<String, OrgEntry>,
}

#[derive(Deserialize)]
struct OrgEntry {
    keys: OrgCredential,
}

/// Mapping of organization name (case-sensitive) to credential pair
#[derive(Debug, Clone)]
pub struct CredentialDirectory {
    orgs: HashMap<String, OrgCredential>,
}

impl CredentialDirectory {
    /// Parse a secret document into a directory
    pub fn from_document(document: &str) -> Result<Self, DirectoryError> {
        let parsed: SecretDocument =
            serde_json::from_str(document).map_err(|e| DirectoryError::SecretUnavailable {
                detail: format!("Secret document parse failed: {}", e),
            })?;

        let orgs = parsed
            .orgs
            .into_iter()
            .map(|(name, entry)| (name, entry.keys))
            .collect();
        Ok(Self { orgs })
    }

    /// Fetch the secret document through the store and build the directory
    pub async fn load(
        store: &dyn SecretStore,
        secret_name: &str,
    ) -> Result<Self, DirectoryError> {
        let document =
            store
                .fetch(secret_name)
                .await
                .map_err(|e| DirectoryError::SecretUnavailable {
                    detail: e.to_string(),
                })?;

        let directory = Self::from_document(&document)?;
        info!(
            "Credential directory loaded with {} organization(s)",
            directory.len()
        );
        Ok(directory)
    }

    /// Resolve an organization's credential pair
    pub fn resolve(&self, org: &str) -> Result<&OrgCredential, DirectoryError> {
        self.orgs.get(org).ok_or_else(|| DirectoryError::OrgNotFound {
            org: org.to_string(),
        })
    }

    /// Organization names, sorted for deterministic iteration
    pub fn org_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.orgs.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.orgs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orgs.is_empty()
    }
}

/// Populate-once cache for the credential directory.
///
/// One fetch attempt per invocation: a successful load is reused by warm
/// invocations in the same process, a failed load leaves the cache empty so
/// the next invocation retries.
pub struct DirectoryCache {
    inner: RwLock<Option<Arc<CredentialDirectory>>>,
}

impl DirectoryCache {
    /// Create an empty cache
    pub const fn new() -> Self {
        Self {
            inner: RwLock::new(None),
        }
    }

    /// Return the cached directory, or load it through the store
    pub async fn get_or_load(
        &self,
        store: &dyn SecretStore,
        secret_name: &str,
    ) -> Result<Arc<CredentialDirectory>, DirectoryError> {
        if let Some(directory) = self.inner.read().clone() {
            return Ok(directory);
        }

        match CredentialDirectory::load(store, secret_name).await {
            Ok(directory) => {
                let directory = Arc::new(directory);
                *self.inner.write() = Some(directory.clone());
                Ok(directory)
            }
            Err(e) => {
                warn!("Credential directory load failed: {}", e);
                Err(e)
            }
        }
    }

    /// Drop the cached directory; the next call re-fetches
    pub fn invalidate(&self) {
        *self.inner.write() = None;
    }
}

impl Default for DirectoryCache {
    fn default() -> Self {
        Self::new()
    }
}
