//! Org credential resolution
//!
//! A secret store holds one JSON document mapping organization names to API
//! credential pairs. The directory is loaded whole, at most once per process
//! lifetime, and re-fetched only after a failed load.

mod directory;
mod store;

pub use directory::{CredentialDirectory, DirectoryCache, DirectoryError, OrgCredential};
#[cfg(feature = "aws")]
pub use store::SecretsManagerStore;
pub use store::{EnvSecretStore, SecretStore};
