//! Waitlist request handlers: submit, inspect, close.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{CloseRequestBody, CloseRequestResponse, SubmitRequestBody};
use crate::api::extract::{ApiJson, ApiPath};
use crate::app_state::AppState;
use crate::domain::{RequestId, WaitListRequest};
use crate::error::{AdmissionError, ErrorResponse};

/// `POST /requests` — Submit a student's request against a poll.
///
/// # Errors
///
/// Returns [`AdmissionError`] if the poll is missing or closed, the
/// student already has an open request on it, or is already assigned.
#[utoipa::path(
    post,
    path = "/api/v1/requests",
    tag = "Requests",
    summary = "Submit a request",
    request_body = SubmitRequestBody,
    responses(
        (status = 201, description = "Pending request recorded", body = WaitListRequest),
        (status = 400, description = "Malformed body or path", body = ErrorResponse),
        (status = 404, description = "Poll or student not found", body = ErrorResponse),
        (status = 409, description = "Poll closed, duplicate request, or student already assigned", body = ErrorResponse),
    )
)]
pub async fn submit_request(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SubmitRequestBody>,
) -> Result<impl IntoResponse, AdmissionError> {
    let request = state
        .admission_service
        .submit_request(req.student_id, req.poll_id)
        .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// `GET /requests/{id}` — Get a request.
///
/// # Errors
///
/// Returns [`AdmissionError::RequestNotFound`] for an unknown request.
#[utoipa::path(
    get,
    path = "/api/v1/requests/{id}",
    tag = "Requests",
    summary = "Get a request",
    params(
        ("id" = uuid::Uuid, Path, description = "Request UUID"),
    ),
    responses(
        (status = 200, description = "Request record", body = WaitListRequest),
        (status = 400, description = "Malformed body or path", body = ErrorResponse),
        (status = 404, description = "Request not found", body = ErrorResponse),
    )
)]
pub async fn get_request(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<uuid::Uuid>,
) -> Result<impl IntoResponse, AdmissionError> {
    let request = state
        .admission_service
        .get_request(RequestId::from_uuid(id))
        .await?;
    Ok(Json(request))
}

/// `POST /requests/{id}/close` — Accept or decline a pending request.
///
/// # Errors
///
/// Returns [`AdmissionError`] if the request is unknown or already closed,
/// or an accept hits a closed or full poll or an assigned student.
#[utoipa::path(
    post,
    path = "/api/v1/requests/{id}/close",
    tag = "Requests",
    summary = "Close a request",
    description = "Accepting the request that fills the poll deactivates it and declines every other pending request on it.",
    params(
        ("id" = uuid::Uuid, Path, description = "Request UUID"),
    ),
    request_body = CloseRequestBody,
    responses(
        (status = 200, description = "Request closed", body = CloseRequestResponse),
        (status = 400, description = "Malformed body or path", body = ErrorResponse),
        (status = 404, description = "Request not found", body = ErrorResponse),
        (status = 409, description = "Invalid transition, capacity exceeded, poll closed, or student already assigned", body = ErrorResponse),
    )
)]
pub async fn close_request(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<uuid::Uuid>,
    ApiJson(req): ApiJson<CloseRequestBody>,
) -> Result<impl IntoResponse, AdmissionError> {
    let outcome = state
        .admission_service
        .close_request(RequestId::from_uuid(id), req.decision)
        .await?;
    Ok(Json(CloseRequestResponse::from(outcome)))
}

/// Request routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/requests", post(submit_request))
        .route("/requests/{id}", get(get_request))
        .route("/requests/{id}/close", post(close_request))
}
