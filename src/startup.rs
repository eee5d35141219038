//! Wiring of the proxy components.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use tracing::info;

use crate::api::{start_api_server, AppState};
use crate::config::AppConfig;
use crate::errors::{Error, Result};
use crate::observability::{init_observability, log_config_info};
use crate::secrets::{HttpSecretsConnector, SecretResolver, SessionGateway};
use crate::{APP_NAME, VERSION};

/// Build the shared handler state: HTTP connector, gateway and resolver.
pub fn build_state(config: &AppConfig, metrics_handle: Option<PrometheusHandle>) -> Result<AppState> {
    let upstream = &config.upstream;
    let state_dir = upstream.state_dir();
    std::fs::create_dir_all(&state_dir)
        .map_err(|e| Error::io(format!("Failed to create state dir {}", state_dir.display()), e))?;

    let connector =
        HttpSecretsConnector::new(&upstream.api_url, &upstream.identity_url, upstream.call_timeout())?;
    let gateway = SessionGateway::new(Arc::new(connector), &state_dir, upstream.call_timeout());
    let resolver = SecretResolver::with_ttl(Arc::new(gateway), config.cache.secret_ttl());

    Ok(AppState::new(Arc::new(resolver), upstream.org_id.clone(), metrics_handle))
}

/// Initialize observability and serve until shutdown.
pub async fn run(config: AppConfig) -> Result<()> {
    let metrics_handle = init_observability(&config.observability)?;
    info!(app_name = APP_NAME, version = VERSION, "Starting secret cache proxy");
    log_config_info(&config);

    let state = build_state(&config, metrics_handle)?;
    let eviction = state.resolver.spawn_eviction(config.cache.eviction_interval());

    let result = start_api_server(&config.server, state).await;

    for task in eviction {
        task.abort();
    }
    result
}
