//! Secret store access
//!
//! The store itself is an external collaborator; only the fetch interface is
//! modeled here.

use async_trait::async_trait;

use crate::utils::error::{Result, SyncError};

/// Fetches the raw secret document by identifier
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch the secret document as a string
    async fn fetch(&self, secret_name: &str) -> Result<String>;
}

/// Secret store backed by AWS Secrets Manager
#[cfg(feature = "aws")]
pub struct SecretsManagerStore {
    client: aws_sdk_secretsmanager::Client,
}

#[cfg(feature = "aws")]
impl SecretsManagerStore {
    /// Create a store from the ambient AWS environment (region, IAM role)
    pub async fn new() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self {
            client: aws_sdk_secretsmanager::Client::new(&config),
        }
    }
}

#[cfg(feature = "aws")]
#[async_trait]
impl SecretStore for SecretsManagerStore {
    async fn fetch(&self, secret_name: &str) -> Result<String> {
        let output = self
            .client
            .get_secret_value()
            .secret_id(secret_name)
            .send()
            .await
            .map_err(|e| {
                SyncError::SecretUnavailable(format!("Secrets Manager fetch failed: {}", e))
            })?;

        output
            .secret_string()
            .map(str::to_string)
            .ok_or_else(|| {
                SyncError::SecretUnavailable(format!(
                    "Secret '{}' has no string payload",
                    secret_name
                ))
            })
    }
}

/// Secret store reading the document from an environment variable, for local
/// runs without AWS access.
///
/// The variable name is the uppercased secret name with dashes replaced by
/// underscores.
pub struct EnvSecretStore;

#[async_trait]
impl SecretStore for EnvSecretStore {
    async fn fetch(&self, secret_name: &str) -> Result<String> {
        let var = secret_name.to_uppercase().replace('-', "_");
        std::env::var(&var).map_err(|_| {
            SyncError::SecretUnavailable(format!("Environment variable '{}' is not set", var))
        })
    }
}
