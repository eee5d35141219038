//! # Metrics Collection
//!
//! Prometheus metrics for cache effectiveness and upstream traffic.

use crate::config::ObservabilityConfig;
use crate::errors::{Error, Result};
use ::tracing::info;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Metrics recorder that tracks application metrics
#[derive(Debug, Clone, Default)]
pub struct MetricsRecorder;

impl MetricsRecorder {
    /// Create a new metrics recorder instance
    pub fn new() -> Self {
        Self
    }

    /// Record an inbound request by endpoint
    pub fn record_request(&self, endpoint: &str) {
        let labels = [("endpoint", endpoint.to_string())];
        counter!("secret_requests_total", &labels).increment(1);
    }

    /// Record a cache lookup outcome
    pub fn record_cache_lookup(&self, store: &str, hit: bool) {
        let result = if hit { "hit" } else { "miss" };
        let labels = [("store", store.to_string()), ("result", result.to_string())];
        counter!("secret_cache_lookups_total", &labels).increment(1);
    }

    /// Record an explicit cache reset
    pub fn record_cache_reset(&self) {
        counter!("secret_cache_resets_total").increment(1);
    }

    /// Record an upstream operation with its outcome and duration
    pub fn record_upstream_call(&self, operation: &str, status: &str, duration: f64) {
        let labels = [("operation", operation.to_string()), ("status", status.to_string())];
        counter!("upstream_calls_total", &labels).increment(1);

        let duration_labels = [("operation", operation.to_string())];
        histogram!("upstream_call_duration_seconds", &duration_labels).record(duration);
    }

    pub fn record_session_opened(&self) {
        gauge!("upstream_sessions_open").increment(1.0);
    }

    pub fn record_session_closed(&self) {
        gauge!("upstream_sessions_open").decrement(1.0);
    }

    /// Register descriptions so exports appear before events occur.
    pub fn register_metrics(&self) {
        describe_counter!("secret_requests_total", Unit::Count, "Inbound secret requests by endpoint");
        describe_counter!(
            "secret_cache_lookups_total",
            Unit::Count,
            "Cache lookups grouped by store and hit/miss"
        );
        describe_counter!("secret_cache_resets_total", Unit::Count, "Explicit cache resets");
        describe_counter!(
            "upstream_calls_total",
            Unit::Count,
            "Upstream operations grouped by outcome"
        );
        describe_histogram!(
            "upstream_call_duration_seconds",
            Unit::Seconds,
            "Duration of upstream operations including connect and close"
        );
        describe_gauge!("upstream_sessions_open", Unit::Count, "Currently open upstream sessions");

        counter!("secret_cache_resets_total").absolute(0);
        gauge!("upstream_sessions_open").set(0.0);
    }
}

/// Install the global Prometheus recorder.
///
/// Returns `None` when metrics are disabled. The handle renders the text
/// exposition served at `/metrics`.
pub fn init_metrics(config: &ObservabilityConfig) -> Result<Option<PrometheusHandle>> {
    if !config.enable_metrics {
        return Ok(None);
    }

    let handle = PrometheusBuilder::new()
        .add_global_label("service", &config.service_name)
        .install_recorder()
        .map_err(|e| Error::config(format!("Failed to initialize metrics exporter: {}", e)))?;

    MetricsRecorder::new().register_metrics();
    info!(service_name = %config.service_name, "Metrics collection initialized");

    Ok(Some(handle))
}
