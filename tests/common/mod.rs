//! Shared test infrastructure


use async_trait::async_trait;
use dd_user_sync::{SecretStore, SyncError};

/// Secret store returning a fixed document
pub struct StaticSecretStore {
    document: String,
}

impl StaticSecretStore {
    pub fn new(document: impl Into<String>) -> Self {
        Self {
            document: document.into(),
        }
    }
}

#[async_trait]
impl SecretStore for StaticSecretStore {
    async fn fetch(&self, _secret_name: &str) -> dd_user_sync::Result<String> {
        Ok(self.document.clone())
    }
}

/// Secret store that always fails, for secret-unavailable paths
pub struct FailingSecretStore;

#[async_trait]
impl SecretStore for FailingSecretStore {
    async fn fetch(&self, _secret_name: &str) -> dd_user_sync::Result<String> {
        Err(SyncError::SecretUnavailable("store offline".to_string()))
    }
}
