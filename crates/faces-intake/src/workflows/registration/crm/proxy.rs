use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};

use super::{ContactApi, CrmRequest, ProxyRequest};

pub const PROXY_PATH: &str = "/api/hubspot-submit";
pub const MISSING_TOKEN_MESSAGE: &str = "HubSpot not configured - missing HUBSPOT_ACCESS_TOKEN";

/// Server-side forwarder holding the CRM credential.
pub struct CrmProxy {
    api: Option<Arc<dyn ContactApi>>,
}

impl CrmProxy {
    pub fn new(api: Option<Arc<dyn ContactApi>>) -> Self {
        Self { api }
    }

    /// Proxy that answers every request with the missing-token error.
    pub fn unconfigured() -> Self {
        Self { api: None }
    }

    pub fn is_configured(&self) -> bool {
        self.api.is_some()
    }
}

/// Router serving the proxy at [`PROXY_PATH`].
pub fn crm_proxy_router(proxy: Arc<CrmProxy>) -> Router {
    Router::new()
        .route(
            PROXY_PATH,
            post(forward_handler)
                .options(preflight_handler)
                .fallback(method_not_allowed_handler),
        )
        .with_state(proxy)
}

fn with_cors(response: impl IntoResponse) -> Response {
    let mut response = response.into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    response
}

pub(crate) async fn preflight_handler() -> Response {
    with_cors(StatusCode::NO_CONTENT)
}

pub(crate) async fn method_not_allowed_handler() -> Response {
    with_cors((
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "error": "Method not allowed" })),
    ))
}

pub(crate) async fn forward_handler(State(proxy): State<Arc<CrmProxy>>, body: Bytes) -> Response {
    let Some(api) = proxy.api.as_ref() else {
        tracing::error!("CRM proxy called without an access token");
        return with_cors((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": MISSING_TOKEN_MESSAGE })),
        ));
    };

    let request: ProxyRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(err) => {
            return with_cors((
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "success": false,
                    "error": format!("invalid request body: {err}"),
                })),
            ));
        }
    };

    match api.send(CrmRequest::from(request)).await {
        Ok(reply) if reply.is_success() => {
            let contact_id = reply.body.get("id").cloned().unwrap_or(Value::Null);
            with_cors((
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "contactId": contact_id,
                    "data": reply.body,
                })),
            ))
        }
        Ok(reply) => {
            let status =
                StatusCode::from_u16(reply.status).unwrap_or(StatusCode::BAD_GATEWAY);
            tracing::warn!(status = reply.status, "CRM rejected proxied request");
            with_cors((
                status,
                Json(json!({
                    "success": false,
                    "error": reply.message(),
                    "details": reply.body,
                })),
            ))
        }
        Err(err) => {
            tracing::error!(error = %err, "CRM proxy request failed");
            with_cors((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "error": err.to_string(),
                })),
            ))
        }
    }
}
