//! In-memory upstream used by unit tests.

use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::client::{SecretsSession, SessionConnector};
use super::error::{Result, SecretsError};
use super::types::{AccessToken, SecretIdentifier, SecretRecord};

pub const TEST_ORG: &str = "org-1";
pub const VALID_TOKEN: &str = "valid-token";

pub fn record(id: &str, key: &str) -> SecretRecord {
    SecretRecord {
        id: id.to_string(),
        organization_id: TEST_ORG.to_string(),
        project_id: None,
        key: key.to_string(),
        value: format!("value-of-{}", key),
        note: String::new(),
        creation_date: Utc::now(),
        revision_date: Utc::now(),
    }
}

#[derive(Debug, Default)]
pub struct Stats {
    pub connects: AtomicUsize,
    pub closes: AtomicUsize,
    pub open: AtomicUsize,
    pub max_open: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub get_calls: AtomicUsize,
    pub batch_calls: AtomicUsize,
    pub state_files: Mutex<Vec<PathBuf>>,
}

#[derive(Debug, Default)]
struct Shared {
    records: Mutex<Vec<SecretRecord>>,
    call_delay: Mutex<Duration>,
    fail_next: AtomicBool,
    fail_close: AtomicBool,
    stats: Arc<Stats>,
}

/// Upstream double holding records in memory. Only [`VALID_TOKEN`] is
/// accepted.
#[derive(Debug)]
pub struct InMemoryConnector {
    shared: Arc<Shared>,
    pub stats: Arc<Stats>,
}

impl InMemoryConnector {
    pub fn new() -> Self {
        let stats = Arc::new(Stats::default());
        let shared = Arc::new(Shared { stats: stats.clone(), ..Default::default() });
        Self { shared, stats }
    }

    pub fn with_secret(self, record: SecretRecord) -> Self {
        self.shared.records.lock().unwrap().push(record);
        self
    }

    pub fn with_call_delay(self, delay: Duration) -> Self {
        *self.shared.call_delay.lock().unwrap() = delay;
        self
    }

    /// Replace the value of every record with `id`.
    pub fn update_value(&self, id: &str, value: &str) {
        for record in self.shared.records.lock().unwrap().iter_mut().filter(|r| r.id == id) {
            record.value = value.to_string();
        }
    }

    /// Make the next session call fail with a connection error.
    pub fn fail_next_call(&self) {
        self.shared.fail_next.store(true, Ordering::SeqCst);
    }

    /// Make every session close report an error.
    pub fn fail_close(&self) {
        self.shared.fail_close.store(true, Ordering::SeqCst);
    }

    pub fn upstream_calls(&self) -> usize {
        self.stats.list_calls.load(Ordering::SeqCst)
            + self.stats.get_calls.load(Ordering::SeqCst)
            + self.stats.batch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionConnector for InMemoryConnector {
    async fn connect(
        &self,
        credential: &AccessToken,
        state_file: &Path,
    ) -> Result<Box<dyn SecretsSession>> {
        self.stats.connects.fetch_add(1, Ordering::SeqCst);
        self.stats.state_files.lock().unwrap().push(state_file.to_path_buf());
        if credential.expose() != VALID_TOKEN {
            return Err(SecretsError::authentication_failed("invalid access token"));
        }
        let open = self.stats.open.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.max_open.fetch_max(open, Ordering::SeqCst);
        Ok(Box::new(InMemorySession { shared: self.shared.clone() }))
    }
}

struct InMemorySession {
    shared: Arc<Shared>,
}

impl InMemorySession {
    async fn enter(&self, counter: &AtomicUsize) -> Result<()> {
        let stats = &self.shared.stats;
        counter.fetch_add(1, Ordering::SeqCst);
        let in_flight = stats.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        stats.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);

        let delay = *self.shared.call_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        stats.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.shared.fail_next.swap(false, Ordering::SeqCst) {
            return Err(SecretsError::connection_failed("connection reset by peer"));
        }
        Ok(())
    }
}

#[async_trait]
impl SecretsSession for InMemorySession {
    async fn list_secrets(&self, organization_id: &str) -> Result<Vec<SecretIdentifier>> {
        self.enter(&self.shared.stats.list_calls).await?;
        let records = self.shared.records.lock().unwrap();
        Ok(records
            .iter()
            .filter(|r| r.organization_id == organization_id)
            .map(|r| SecretIdentifier::new(&r.id, &r.organization_id, &r.key))
            .collect())
    }

    async fn get_secret(&self, id: &str) -> Result<SecretRecord> {
        self.enter(&self.shared.stats.get_calls).await?;
        let records = self.shared.records.lock().unwrap();
        records.iter().find(|r| r.id == id).cloned().ok_or_else(|| SecretsError::not_found(id))
    }

    async fn get_secrets_by_ids(&self, ids: &[String]) -> Result<Vec<SecretRecord>> {
        self.enter(&self.shared.stats.batch_calls).await?;
        let records = self.shared.records.lock().unwrap();
        Ok(records.iter().filter(|r| ids.contains(&r.id)).cloned().collect())
    }

    async fn close(&self) -> Result<()> {
        self.shared.stats.closes.fetch_add(1, Ordering::SeqCst);
        self.shared.stats.open.fetch_sub(1, Ordering::SeqCst);
        if self.shared.fail_close.load(Ordering::SeqCst) {
            return Err(SecretsError::backend_error("logout rejected"));
        }
        Ok(())
    }
}

