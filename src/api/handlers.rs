use axum::{
    extract::{Path, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{debug, error, info};

use super::auth::BearerToken;
use super::error::ApiError;
use super::routes::AppState;

const JSON_CONTENT_TYPE: &str = "application/json";

pub async fn get_secret_by_id_handler(
    State(state): State<AppState>,
    Path(secret_id): Path<String>,
    BearerToken(token): BearerToken,
) -> Result<Response, ApiError> {
    state.metrics.record_request("id");
    debug!(secret_id = %secret_id, "Getting secret by id");

    let payload = state.resolver.get_by_id(&secret_id, &token).await.map_err(|e| {
        error!(secret_id = %secret_id, error = %e, "Failed to get secret by id");
        ApiError::from(e)
    })?;

    Ok(([(CONTENT_TYPE, JSON_CONTENT_TYPE)], payload).into_response())
}

pub async fn get_secret_by_key_handler(
    State(state): State<AppState>,
    Path(secret_key): Path<String>,
    BearerToken(token): BearerToken,
) -> Result<Response, ApiError> {
    state.metrics.record_request("key");
    debug!(secret_key = %secret_key, "Getting secret by key");

    let payload =
        state.resolver.get_by_key(&secret_key, &state.org_id, &token).await.map_err(|e| {
            error!(secret_key = %secret_key, error = %e, "Failed to get secret by key");
            ApiError::from(e)
        })?;

    Ok(([(CONTENT_TYPE, JSON_CONTENT_TYPE)], payload).into_response())
}

pub async fn reset_cache_handler(State(state): State<AppState>) -> StatusCode {
    state.metrics.record_request("cache");
    info!("Resetting cache");
    state.resolver.reset_cache().await;
    StatusCode::OK
}

pub async fn ping_handler() -> &'static str {
    "."
}

pub async fn metrics_handler(State(state): State<AppState>) -> Response {
    match &state.metrics_handle {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
