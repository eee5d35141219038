//! Time-expiring string store used for both cache layers.
//!
//! Every entry written to a [`TtlStore`] expires `ttl` after it was written.
//! Reads never extend an entry's lifetime unless the store was explicitly
//! built with [`TouchPolicy::OnHit`], so all entries written in one batch
//! share the same staleness bound.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::debug;

/// Read-path behavior of a [`TtlStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TouchPolicy {
    /// `get` leaves the expiry untouched.
    #[default]
    Disabled,
    /// `get` re-arms the expiry to `now + ttl` on every hit.
    OnHit,
}

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// In-memory key/value store with a single TTL for all entries.
///
/// Cloning a store yields another handle to the same entries.
#[derive(Debug, Clone)]
pub struct TtlStore {
    name: &'static str,
    inner: Arc<RwLock<HashMap<String, Entry>>>,
    ttl: Duration,
    touch: TouchPolicy,
}

impl TtlStore {
    /// Create a store whose reads never extend an entry's expiry.
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        Self::with_touch_policy(name, ttl, TouchPolicy::Disabled)
    }

    /// Create a store with an explicit read-path policy.
    pub fn with_touch_policy(name: &'static str, ttl: Duration, touch: TouchPolicy) -> Self {
        debug!(store = name, ttl_secs = ttl.as_secs(), ?touch, "Creating TTL store");
        Self { name, inner: Arc::new(RwLock::new(HashMap::new())), ttl, touch }
    }

    /// True if an unexpired entry exists for `key`.
    pub async fn has(&self, key: &str) -> bool {
        let entries = self.inner.read().await;
        entries.get(key).is_some_and(|entry| entry.is_live(Instant::now()))
    }

    /// Return the value stored for `key`, or `None` when absent or expired.
    pub async fn get(&self, key: &str) -> Option<String> {
        match self.touch {
            TouchPolicy::Disabled => {
                let entries = self.inner.read().await;
                match entries.get(key) {
                    Some(entry) if entry.is_live(Instant::now()) => {
                        debug!(store = self.name, key = %key, "Cache hit");
                        Some(entry.value.clone())
                    }
                    _ => {
                        debug!(store = self.name, key = %key, "Cache miss");
                        None
                    }
                }
            }
            TouchPolicy::OnHit => {
                let mut entries = self.inner.write().await;
                let now = Instant::now();
                match entries.get_mut(key) {
                    Some(entry) if entry.is_live(now) => {
                        entry.expires_at = now + self.ttl;
                        debug!(store = self.name, key = %key, "Cache hit, expiry extended");
                        Some(entry.value.clone())
                    }
                    _ => {
                        debug!(store = self.name, key = %key, "Cache miss");
                        None
                    }
                }
            }
        }
    }

    /// Insert or replace `key`, expiring `ttl` from now.
    pub async fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        debug!(store = self.name, key = %key, "Setting cache entry");
        let expires_at = Instant::now() + self.ttl;
        let mut entries = self.inner.write().await;
        entries.insert(key, Entry { value: value.into(), expires_at });
    }

    /// Insert a batch of entries under one lock with one shared expiry.
    pub async fn set_many<I, K, V>(&self, pairs: I) -> usize
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let expires_at = Instant::now() + self.ttl;
        let mut entries = self.inner.write().await;
        let mut written = 0;
        for (key, value) in pairs {
            entries.insert(key.into(), Entry { value: value.into(), expires_at });
            written += 1;
        }
        debug!(store = self.name, count = written, "Batch populated cache");
        written
    }

    /// Drop every entry.
    pub async fn reset(&self) {
        let mut entries = self.inner.write().await;
        let count = entries.len();
        entries.clear();
        debug!(store = self.name, count, "Reset cache");
    }

    /// Remove expired entries, returning how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.inner.write().await;
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        let purged = before - entries.len();
        if purged > 0 {
            debug!(store = self.name, purged, "Evicted expired cache entries");
        }
        purged
    }

    /// Periodically evict expired entries for the lifetime of the runtime.
    ///
    /// Eviction only reclaims memory; expired entries are already invisible
    /// to `get` and `has`.
    pub fn spawn_eviction_task(&self, interval: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                store.purge_expired().await;
            }
        })
    }

    /// Number of stored entries, expired ones included until evicted.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn touch_policy(&self) -> TouchPolicy {
        self.touch
    }
}
