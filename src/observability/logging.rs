//! # Structured Logging
//!
//! Subscriber setup and span helpers built on the tracing ecosystem.
//!
//! `RUST_LOG` always wins over the configured level, so a single deployment
//! can be debugged without touching its config file.

use crate::config::{AppConfig, ObservabilityConfig};
use crate::errors::{Error, Result};
use tracing_subscriber::EnvFilter;

/// Create a tracing span for one upstream operation, with optional extra
/// fields.
///
/// ```rust,ignore
/// let span = upstream_span!("list_secrets", call_timeout_ms = 30_000);
/// ```
#[macro_export]
macro_rules! upstream_span {
    ($operation:expr $(, $($field:tt)*)?) => {
        tracing::debug_span!(
            "upstream_operation",
            operation = %$operation,
            operation_id = %uuid::Uuid::new_v4()
            $(, $($field)*)?
        )
    };
}

/// Create a tracing span for a cache lookup by id or key.
#[macro_export]
macro_rules! cache_span {
    ($operation:expr, $subject:expr) => {
        tracing::debug_span!("secret_lookup", operation = %$operation, subject = %$subject)
    };
}

/// Build the filter from `RUST_LOG`, falling back to `default_level`.
pub fn env_filter(default_level: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(default_level)
            .map_err(|e| Error::config(format!("Invalid log level '{}': {}", default_level, e))),
    }
}

/// Install the global subscriber.
///
/// Returns an error when the level cannot be parsed. An already-installed
/// subscriber (e.g. in tests) is left in place.
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    let filter = env_filter(&config.log_level)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    let installed = if config.json_logging {
        builder.json().flatten_event(true).try_init()
    } else {
        builder.try_init()
    };

    if installed.is_err() {
        // Subscriber already set elsewhere; ignore.
    }
    Ok(())
}

/// Log configuration at startup
pub fn log_config_info(config: &AppConfig) {
    tracing::info!(
        service_name = %config.observability.service_name,
        server_address = %config.server.bind_address(),
        upstream_api = %config.upstream.api_url,
        upstream_identity = %config.upstream.identity_url,
        org_id = %config.upstream.org_id,
        secret_ttl_seconds = config.cache.secret_ttl_seconds,
        metrics_enabled = config.observability.enable_metrics,
        "Secret cache proxy configuration"
    );
}
