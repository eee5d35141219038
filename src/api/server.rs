use tokio::net::TcpListener;
use tracing::{info, warn};

use super::routes::{build_router, AppState};
use crate::config::ServerConfig;
use crate::errors::Error;

/// Bind and serve until Ctrl-C.
pub async fn start_api_server(config: &ServerConfig, state: AppState) -> crate::Result<()> {
    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| Error::transport(format!("Failed to bind API server on {}: {}", addr, e)))?;

    serve(listener, state, config).await
}

/// Serve on an already-bound listener.
pub async fn serve(listener: TcpListener, state: AppState, config: &ServerConfig) -> crate::Result<()> {
    let router = build_router(state, config.request_timeout());
    let local = listener.local_addr().map_err(|e| Error::io("Failed to read listener address", e))?;
    info!(address = %local, "Starting HTTP API server");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::transport(format!("API server error: {}", e)))?;

    info!("API server shutdown completed");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "API server shutdown listener failed");
    }
}
