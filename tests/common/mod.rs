//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use chrono::Utc;
use metrics_exporter_prometheus::PrometheusHandle;
use secret_cache_proxy::api::{build_router, AppState};
use secret_cache_proxy::secrets::{
    AccessToken, Result, SecretIdentifier, SecretRecord, SecretResolver, SecretsError,
    SecretsSession, SessionConnector, SessionGateway,
};

pub const ORG_ID: &str = "org-1";
pub const TOKEN: &str = "0.valid-access-token";

pub fn secret(id: &str, key: &str, value: &str) -> SecretRecord {
    SecretRecord {
        id: id.to_string(),
        organization_id: ORG_ID.to_string(),
        project_id: Some("project-1".to_string()),
        key: key.to_string(),
        value: value.to_string(),
        note: String::new(),
        creation_date: Utc::now(),
        revision_date: Utc::now(),
    }
}

/// Counting upstream double. Accepts only [`TOKEN`].
#[derive(Debug, Default)]
pub struct FakeUpstream {
    records: Mutex<Vec<SecretRecord>>,
    delay_ms: AtomicU64,
    connects: AtomicUsize,
    calls: Arc<AtomicUsize>,
    sessions: Arc<SessionCount>,
}

#[derive(Debug, Default)]
struct SessionCount {
    open: AtomicUsize,
    max_open: AtomicUsize,
}

impl FakeUpstream {
    pub fn with_secrets(records: Vec<SecretRecord>) -> Arc<Self> {
        Arc::new(Self { records: Mutex::new(records), ..Default::default() })
    }

    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn open(&self) -> usize {
        self.sessions.open.load(Ordering::SeqCst)
    }

    pub fn max_open(&self) -> usize {
        self.sessions.max_open.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionConnector for FakeUpstream {
    async fn connect(
        &self,
        credential: &AccessToken,
        _state_file: &Path,
    ) -> Result<Box<dyn SecretsSession>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if credential.expose() != TOKEN {
            return Err(SecretsError::authentication_failed("Upstream rejected credentials"));
        }
        let open = self.sessions.open.fetch_add(1, Ordering::SeqCst) + 1;
        self.sessions.max_open.fetch_max(open, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            records: self.records.lock().unwrap().clone(),
            delay: Duration::from_millis(self.delay_ms.load(Ordering::SeqCst)),
            calls: self.calls.clone(),
            sessions: self.sessions.clone(),
        }))
    }
}

struct FakeSession {
    records: Vec<SecretRecord>,
    delay: Duration,
    calls: Arc<AtomicUsize>,
    sessions: Arc<SessionCount>,
}

impl FakeSession {
    async fn call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

#[async_trait]
impl SecretsSession for FakeSession {
    async fn list_secrets(&self, organization_id: &str) -> Result<Vec<SecretIdentifier>> {
        self.call().await;
        Ok(self
            .records
            .iter()
            .filter(|r| r.organization_id == organization_id)
            .map(|r| SecretIdentifier::new(r.id.clone(), r.organization_id.clone(), r.key.clone()))
            .collect())
    }

    async fn get_secret(&self, id: &str) -> Result<SecretRecord> {
        self.call().await;
        self.records.iter().find(|r| r.id == id).cloned().ok_or_else(|| SecretsError::not_found(id))
    }

    async fn get_secrets_by_ids(&self, ids: &[String]) -> Result<Vec<SecretRecord>> {
        self.call().await;
        Ok(self.records.iter().filter(|r| ids.contains(&r.id)).cloned().collect())
    }

    async fn close(&self) -> Result<()> {
        self.sessions.open.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

pub struct TestApp {
    pub state: AppState,
    pub request_timeout: Duration,
}

impl TestApp {
    pub fn new(connector: Arc<dyn SessionConnector>) -> Self {
        Self::with_options(connector, Duration::from_secs(5), None)
    }

    pub fn with_options(
        connector: Arc<dyn SessionConnector>,
        request_timeout: Duration,
        metrics_handle: Option<PrometheusHandle>,
    ) -> Self {
        let gateway = SessionGateway::new(connector, &std::env::temp_dir(), Duration::from_secs(5));
        let resolver = SecretResolver::with_ttl(Arc::new(gateway), Duration::from_secs(60));
        let state = AppState::new(Arc::new(resolver), ORG_ID, metrics_handle);
        Self { state, request_timeout }
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone(), self.request_timeout)
    }
}
