use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{HeaderName, Request},
    routing::get,
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use super::handlers::{
    get_secret_by_id_handler, get_secret_by_key_handler, metrics_handler, ping_handler,
    reset_cache_handler,
};
use crate::observability::MetricsRecorder;
use crate::secrets::SecretResolver;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Shared handler state, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<SecretResolver>,
    pub org_id: Arc<str>,
    pub metrics: MetricsRecorder,
    pub metrics_handle: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(
        resolver: Arc<SecretResolver>,
        org_id: impl Into<Arc<str>>,
        metrics_handle: Option<PrometheusHandle>,
    ) -> Self {
        Self { resolver, org_id: org_id.into(), metrics: MetricsRecorder::new(), metrics_handle }
    }
}

pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            let request_id = request
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("");
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                path = %request.uri().path(),
                request_id = %request_id
            )
        }))
        .layer(PropagateRequestIdLayer::new(request_id))
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::new(request_timeout));

    let mut router = Router::new()
        .route("/id/{secret_id}", get(get_secret_by_id_handler))
        .route("/key/{secret_key}", get(get_secret_by_key_handler))
        .route("/reset", get(reset_cache_handler))
        .route("/ping", get(ping_handler));

    if state.metrics_handle.is_some() {
        router = router.route("/metrics", get(metrics_handler));
    }

    router.layer(middleware).with_state(state)
}
