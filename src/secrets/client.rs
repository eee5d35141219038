//! Upstream session traits.
//!
//! A [`SessionConnector`] turns a bearer credential into an authenticated
//! [`SecretsSession`]. The gateway owns the connector and guarantees that at
//! most one session exists at a time, so implementations do not need any
//! locking of their own.

use async_trait::async_trait;
use std::path::Path;

use super::error::Result;
use super::types::{AccessToken, SecretIdentifier, SecretRecord};

/// An authenticated handle to the remote secrets service.
///
/// # Errors
///
/// - [`SecretsError::NotFound`](super::SecretsError::NotFound) if a single
///   requested secret does not exist
/// - [`SecretsError::AuthenticationFailed`](super::SecretsError::AuthenticationFailed)
///   if the session is rejected mid-flight
/// - [`SecretsError::ConnectionFailed`](super::SecretsError::ConnectionFailed)
///   or [`SecretsError::BackendError`](super::SecretsError::BackendError) on
///   transport failures
#[async_trait]
pub trait SecretsSession: Send + Sync {
    /// Enumerate every `(key, id)` pair visible to the organization.
    async fn list_secrets(&self, organization_id: &str) -> Result<Vec<SecretIdentifier>>;

    /// Fetch one secret, value included.
    async fn get_secret(&self, id: &str) -> Result<SecretRecord>;

    /// Fetch several secrets. Ids with no upstream record are simply absent
    /// from the result.
    async fn get_secrets_by_ids(&self, ids: &[String]) -> Result<Vec<SecretRecord>>;

    /// Tear the session down.
    async fn close(&self) -> Result<()>;
}

/// Factory for upstream sessions.
#[async_trait]
pub trait SessionConnector: Send + Sync + std::fmt::Debug {
    /// Authenticate with `credential` and persist session state at
    /// `state_file`.
    async fn connect(
        &self,
        credential: &AccessToken,
        state_file: &Path,
    ) -> Result<Box<dyn SecretsSession>>;
}
