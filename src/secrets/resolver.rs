//! Two-level read-through cache in front of the upstream gateway.
//!
//! `key_to_id` maps a human-readable secret key to its upstream id and is
//! populated in bulk from organization listings. `id_to_secret` maps an id to
//! the serialized secret record. Both stores share one TTL and neither
//! extends expiry on reads, so a cached value is never older than the TTL.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, Instrument};

use super::error::{Result, SecretsError};
use super::gateway::SessionGateway;
use super::types::{AccessToken, SecretRecord};
use crate::cache::TtlStore;
use crate::cache_span;
use crate::observability::MetricsRecorder;

pub const KEY_TO_ID_STORE: &str = "key_to_id";
pub const ID_TO_SECRET_STORE: &str = "id_to_secret";

/// Resolves secrets by id or key, hitting the upstream only on cache misses.
#[derive(Debug)]
pub struct SecretResolver {
    key_to_id: TtlStore,
    id_to_secret: TtlStore,
    gateway: Arc<SessionGateway>,
    metrics: MetricsRecorder,
}

impl SecretResolver {
    pub fn new(key_to_id: TtlStore, id_to_secret: TtlStore, gateway: Arc<SessionGateway>) -> Self {
        Self { key_to_id, id_to_secret, gateway, metrics: MetricsRecorder::new() }
    }

    /// Build a resolver with fresh stores that both use `ttl`.
    pub fn with_ttl(gateway: Arc<SessionGateway>, ttl: Duration) -> Self {
        Self::new(
            TtlStore::new(KEY_TO_ID_STORE, ttl),
            TtlStore::new(ID_TO_SECRET_STORE, ttl),
            gateway,
        )
    }

    /// Return the serialized secret for `id`.
    pub async fn get_by_id(&self, id: &str, credential: &AccessToken) -> Result<String> {
        async {
            if let Some(secret) = self.cached_secret(id).await {
                return Ok(secret);
            }

            let records = self.gateway.get_secrets_by_ids(credential, vec![id.to_string()]).await?;
            let record =
                records.into_iter().find(|r| r.id == id).ok_or_else(|| SecretsError::not_found(id))?;

            self.store_secret(id, &record).await
        }
        .instrument(cache_span!("get_by_id", id))
        .await
    }

    /// Return the serialized secret whose key is `key` within `organization_id`.
    ///
    /// A key miss lists the whole organization and caches every key it sees,
    /// so later lookups of sibling keys skip the listing.
    pub async fn get_by_key(
        &self,
        key: &str,
        organization_id: &str,
        credential: &AccessToken,
    ) -> Result<String> {
        async {
            let id = match self.cached_id(key).await {
                Some(id) => id,
                None => self.resolve_key(key, organization_id, credential).await?,
            };

            if let Some(secret) = self.cached_secret(&id).await {
                return Ok(secret);
            }

            let record = self.gateway.get_secret(credential, &id).await?;
            self.store_secret(&id, &record).await
        }
        .instrument(cache_span!("get_by_key", key))
        .await
    }

    /// Drop every cached entry. Does not contact the upstream.
    pub async fn reset_cache(&self) {
        self.key_to_id.reset().await;
        self.id_to_secret.reset().await;
        self.metrics.record_cache_reset();
        info!("Secret cache reset");
    }

    pub fn key_to_id(&self) -> &TtlStore {
        &self.key_to_id
    }

    pub fn id_to_secret(&self) -> &TtlStore {
        &self.id_to_secret
    }

    /// Start background eviction for both stores.
    pub fn spawn_eviction(&self, interval: Duration) -> Vec<tokio::task::JoinHandle<()>> {
        vec![
            self.key_to_id.spawn_eviction_task(interval),
            self.id_to_secret.spawn_eviction_task(interval),
        ]
    }

    async fn resolve_key(
        &self,
        key: &str,
        organization_id: &str,
        credential: &AccessToken,
    ) -> Result<String> {
        let listing = self.gateway.list_secrets(credential, organization_id).await?;
        let found = listing.iter().find(|s| s.key == key).map(|s| s.id.clone());

        let count = self.key_to_id.set_many(listing.into_iter().map(|s| (s.key, s.id))).await;
        debug!(count, organization_id, "Populated key map from listing");

        let found = found.ok_or_else(|| SecretsError::not_found(key))?;
        // Another task may have refreshed the entry since the listing
        Ok(self.key_to_id.get(key).await.unwrap_or(found))
    }

    async fn cached_id(&self, key: &str) -> Option<String> {
        let id = self.key_to_id.get(key).await;
        self.metrics.record_cache_lookup(KEY_TO_ID_STORE, id.is_some());
        id
    }

    async fn cached_secret(&self, id: &str) -> Option<String> {
        let secret = self.id_to_secret.get(id).await;
        self.metrics.record_cache_lookup(ID_TO_SECRET_STORE, secret.is_some());
        secret
    }

    async fn store_secret(&self, id: &str, record: &SecretRecord) -> Result<String> {
        let payload = serde_json::to_string(record)?;
        self.id_to_secret.set(id, payload.clone()).await;
        Ok(payload)
    }
}
