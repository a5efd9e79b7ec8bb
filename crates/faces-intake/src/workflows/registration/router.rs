use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{FieldUpdate, Gender};
use super::service::{RegistrationService, RegistrationServiceError, SessionId};

#[derive(Debug, Deserialize)]
pub(crate) struct GenderSelection {
    pub gender: Gender,
}

/// Router exposing the hosted wizard.
pub fn registration_router(service: Arc<RegistrationService>) -> Router {
    Router::new()
        .route("/api/v1/steps", get(steps_handler))
        .route("/api/v1/locations", get(locations_handler))
        .route("/api/v1/registrations", post(create_handler))
        .route(
            "/api/v1/registrations/:session_id",
            get(view_handler).delete(discard_handler),
        )
        .route(
            "/api/v1/registrations/:session_id/fields",
            patch(update_field_handler),
        )
        .route(
            "/api/v1/registrations/:session_id/gender",
            post(select_gender_handler),
        )
        .route(
            "/api/v1/registrations/:session_id/advance",
            post(advance_handler),
        )
        .route(
            "/api/v1/registrations/:session_id/retreat",
            post(retreat_handler),
        )
        .route("/api/v1/registrations/:session_id/skip", post(skip_handler))
        .route(
            "/api/v1/registrations/:session_id/submit",
            post(submit_handler),
        )
        .with_state(service)
}

fn error_response(error: RegistrationServiceError) -> Response {
    let status = match error {
        RegistrationServiceError::NotFound => StatusCode::NOT_FOUND,
        RegistrationServiceError::Wizard(_) => StatusCode::CONFLICT,
    };
    let payload = json!({
        "error": error.to_string(),
    });
    (status, Json(payload)).into_response()
}

fn parse_session(raw: &str) -> Result<SessionId, Response> {
    raw.parse().map_err(|_| {
        let payload = json!({
            "error": "registration session not found",
        });
        (StatusCode::NOT_FOUND, Json(payload)).into_response()
    })
}

pub(crate) async fn steps_handler(State(service): State<Arc<RegistrationService>>) -> Response {
    let steps: Vec<_> = service
        .registry()
        .iter()
        .map(|step| {
            json!({
                "position": step.position,
                "kind": step.kind,
                "label": step.kind.label(),
                "mandatory": step.mandatory,
                "required_fields": step.kind.required_fields(),
            })
        })
        .collect();
    (StatusCode::OK, Json(json!({ "steps": steps }))).into_response()
}

pub(crate) async fn locations_handler(
    State(service): State<Arc<RegistrationService>>,
) -> Response {
    (StatusCode::OK, Json(service.catalog().clone())).into_response()
}

pub(crate) async fn create_handler(State(service): State<Arc<RegistrationService>>) -> Response {
    let view = service.create();
    (StatusCode::CREATED, Json(view)).into_response()
}

pub(crate) async fn view_handler(
    State(service): State<Arc<RegistrationService>>,
    Path(session_id): Path<String>,
) -> Response {
    let id = match parse_session(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match service.view(&id) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn discard_handler(
    State(service): State<Arc<RegistrationService>>,
    Path(session_id): Path<String>,
) -> Response {
    let id = match parse_session(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match service.discard(&id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_field_handler(
    State(service): State<Arc<RegistrationService>>,
    Path(session_id): Path<String>,
    Json(update): Json<FieldUpdate>,
) -> Response {
    let id = match parse_session(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match service.update_field(&id, update) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn select_gender_handler(
    State(service): State<Arc<RegistrationService>>,
    Path(session_id): Path<String>,
    Json(selection): Json<GenderSelection>,
) -> Response {
    let id = match parse_session(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match service.select_gender(&id, selection.gender) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn advance_handler(
    State(service): State<Arc<RegistrationService>>,
    Path(session_id): Path<String>,
) -> Response {
    let id = match parse_session(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match service.advance(&id) {
        Ok(result) if result.validation.is_valid() => {
            (StatusCode::OK, Json(result.session)).into_response()
        }
        Ok(result) => {
            let payload = json!({
                "error": result.validation.reason(),
                "validation": result.validation.view(),
                "session": result.session,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn retreat_handler(
    State(service): State<Arc<RegistrationService>>,
    Path(session_id): Path<String>,
) -> Response {
    let id = match parse_session(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match service.retreat(&id) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn skip_handler(
    State(service): State<Arc<RegistrationService>>,
    Path(session_id): Path<String>,
) -> Response {
    let id = match parse_session(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match service.skip(&id) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn submit_handler(
    State(service): State<Arc<RegistrationService>>,
    Path(session_id): Path<String>,
) -> Response {
    let id = match parse_session(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match service.submit(&id).await {
        Ok(result) => {
            let status = if result.outcome.success {
                StatusCode::OK
            } else {
                StatusCode::BAD_GATEWAY
            };
            let payload = json!({
                "success": result.outcome.success,
                "application_id": result.outcome.application_id,
                "created_at": result.outcome.created_at,
                "error": result.outcome.error,
                "session": result.session,
            });
            (status, Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}
