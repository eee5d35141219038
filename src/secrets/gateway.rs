//! Serialized access to the upstream secrets service.
//!
//! The upstream session is stateful and expensive, so the gateway keeps at
//! most one of them alive. Every operation runs the full
//! lock → connect → call → close → unlock sequence; concurrent callers queue
//! on the lock. Cache hits never reach this module.
//!
//! # Cancellation
//!
//! Once the lock is acquired the sequence runs on its own task, which owns
//! the lock guard. Dropping a pending [`SessionGateway::with_session`] future
//! (for example when the HTTP timeout layer abandons the request) detaches
//! the caller only: the session is still closed and the lock is released
//! after close returns. Connect, call and close are each bounded by the
//! configured call timeout, so an abandoned sequence always finishes.

use futures::future::BoxFuture;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, warn, Instrument};

use super::client::{SecretsSession, SessionConnector};
use super::error::{Result, SecretsError};
use super::types::{AccessToken, SecretIdentifier, SecretRecord};
use crate::observability::MetricsRecorder;
use crate::upstream_span;

/// Owner of the single upstream session.
#[derive(Debug)]
pub struct SessionGateway {
    upstream: Arc<Upstream>,
    lock: Arc<Mutex<()>>,
}

/// Everything a detached session task needs.
#[derive(Debug)]
struct Upstream {
    connector: Arc<dyn SessionConnector>,
    state_file: PathBuf,
    call_timeout: Duration,
    metrics: MetricsRecorder,
}

impl SessionGateway {
    /// Create a gateway. The session state file path is chosen here, once,
    /// and reused by every session the gateway establishes.
    pub fn new(
        connector: Arc<dyn SessionConnector>,
        state_dir: &Path,
        call_timeout: Duration,
    ) -> Self {
        let state_file = state_dir.join(format!("secret-cache-proxy-{}", uuid::Uuid::new_v4()));
        debug!(state_file = %state_file.display(), "Upstream session state path selected");
        Self {
            upstream: Arc::new(Upstream {
                connector,
                state_file,
                call_timeout,
                metrics: MetricsRecorder::new(),
            }),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn state_file(&self) -> &Path {
        &self.upstream.state_file
    }

    /// Run `f` against a freshly connected session while holding exclusive
    /// access to the upstream.
    ///
    /// The session is always closed before the lock is released, even when
    /// the caller stops waiting. A failed close is logged and does not
    /// replace the result of `f`.
    pub async fn with_session<T, F>(
        &self,
        credential: &AccessToken,
        operation: &'static str,
        f: F,
    ) -> Result<T>
    where
        T: Send + 'static,
        F: for<'s> FnOnce(&'s dyn SecretsSession) -> BoxFuture<'s, Result<T>> + Send + 'static,
    {
        let span = upstream_span!(operation, call_timeout_ms = self.upstream.timeout_ms());
        let upstream = self.upstream.clone();
        let credential = credential.clone();

        async move {
            debug!("Waiting for upstream session lock");
            let guard = self.lock.clone().lock_owned().await;

            let task = tokio::spawn(
                async move {
                    let result = upstream.run(&credential, operation, f).await;
                    debug!("Releasing upstream session lock");
                    drop(guard);
                    result
                }
                .in_current_span(),
            );

            match task.await {
                Ok(result) => result,
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(e) => Err(SecretsError::backend_error(format!("upstream task aborted: {}", e))),
            }
        }
        .instrument(span)
        .await
    }

    /// List every `(key, id)` pair of an organization.
    pub async fn list_secrets(
        &self,
        credential: &AccessToken,
        organization_id: &str,
    ) -> Result<Vec<SecretIdentifier>> {
        let organization_id = organization_id.to_string();
        self.with_session(credential, "list_secrets", move |session| {
            Box::pin(async move { session.list_secrets(&organization_id).await })
        })
        .await
    }

    /// Fetch a single secret by id.
    pub async fn get_secret(&self, credential: &AccessToken, id: &str) -> Result<SecretRecord> {
        let id = id.to_string();
        self.with_session(credential, "get_secret", move |session| {
            Box::pin(async move { session.get_secret(&id).await })
        })
        .await
    }

    /// Fetch a batch of secrets by id.
    pub async fn get_secrets_by_ids(
        &self,
        credential: &AccessToken,
        ids: Vec<String>,
    ) -> Result<Vec<SecretRecord>> {
        self.with_session(credential, "get_secrets_by_ids", move |session| {
            Box::pin(async move { session.get_secrets_by_ids(&ids).await })
        })
        .await
    }
}

impl Upstream {
    /// Connect, call and close. Runs with the gateway lock held.
    async fn run<T, F>(&self, credential: &AccessToken, operation: &'static str, f: F) -> Result<T>
    where
        F: for<'s> FnOnce(&'s dyn SecretsSession) -> BoxFuture<'s, Result<T>>,
    {
        let started = Instant::now();

        debug!("Opening upstream session");
        let session =
            match timeout(self.call_timeout, self.connector.connect(credential, &self.state_file))
                .await
            {
                Ok(Ok(session)) => session,
                Ok(Err(e)) => {
                    debug!(error = %e, "Failed to open upstream session");
                    self.record(operation, e.kind(), started);
                    return Err(e);
                }
                Err(_) => {
                    let e = SecretsError::timeout("connect", self.timeout_ms());
                    self.record(operation, e.kind(), started);
                    return Err(e);
                }
            };
        let open = OpenSession::new(&self.metrics);

        let result = match timeout(self.call_timeout, f(session.as_ref())).await {
            Ok(result) => result,
            Err(_) => Err(SecretsError::timeout(operation, self.timeout_ms())),
        };

        debug!("Closing upstream session");
        match timeout(self.call_timeout, session.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "Upstream session did not close cleanly"),
            Err(_) => warn!(timeout_ms = self.timeout_ms(), "Upstream session close timed out"),
        }
        drop(open);

        let status = match &result {
            Ok(_) => "success",
            Err(e) => e.kind(),
        };
        self.record(operation, status, started);
        result
    }

    fn record(&self, operation: &'static str, status: &str, started: Instant) {
        self.metrics.record_upstream_call(operation, status, started.elapsed().as_secs_f64());
    }

    fn timeout_ms(&self) -> u64 {
        self.call_timeout.as_millis() as u64
    }
}

/// Tracks the open-session gauge for the lifetime of one session.
struct OpenSession<'a> {
    metrics: &'a MetricsRecorder,
}

impl<'a> OpenSession<'a> {
    fn new(metrics: &'a MetricsRecorder) -> Self {
        metrics.record_session_opened();
        Self { metrics }
    }
}

impl Drop for OpenSession<'_> {
    fn drop(&mut self) {
        self.metrics.record_session_closed();
    }
}
