use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use faces_intake::workflows::registration::{
    crm_proxy_router, registration_router, CrmProxy, RegistrationService,
};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_intake_routes(
    service: Arc<RegistrationService>,
    proxy: Arc<CrmProxy>,
) -> axum::Router {
    registration_router(service)
        .merge(crm_proxy_router(proxy))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/crm/sync-failures",
            axum::routing::get(sync_failures_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn sync_failures_endpoint(
    Extension(state): Extension<AppState>,
) -> Json<serde_json::Value> {
    let failures = state.sync_failures.recent();
    Json(json!({
        "count": failures.len(),
        "failures": failures,
    }))
}
