//! Student-centric read endpoints.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::extract::ApiPath;
use crate::app_state::AppState;
use crate::domain::{Assignment, StudentId, WaitListRequest};
use crate::error::{AdmissionError, ErrorResponse};

/// `GET /students/{id}/requests` — All of a student's requests.
///
/// # Errors
///
/// Never fails for a well-formed ID; an unknown student has no requests.
#[utoipa::path(
    get,
    path = "/api/v1/students/{id}/requests",
    tag = "Students",
    summary = "List a student's requests",
    params(
        ("id" = i64, Path, description = "Student ID"),
    ),
    responses(
        (status = 200, description = "Requests across all polls, oldest first", body = Vec<WaitListRequest>),
    )
)]
pub async fn list_student_requests(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, AdmissionError> {
    let requests = state
        .admission_service
        .list_for_student(StudentId::new(id))
        .await;
    Ok(Json(requests))
}

/// `GET /students/{id}/assignment` — The advisor a student was accepted by.
///
/// # Errors
///
/// Returns [`AdmissionError::AssignmentNotFound`] if the student is not
/// assigned.
#[utoipa::path(
    get,
    path = "/api/v1/students/{id}/assignment",
    tag = "Students",
    summary = "Get a student's assignment",
    params(
        ("id" = i64, Path, description = "Student ID"),
    ),
    responses(
        (status = 200, description = "Accepted poll and advisor", body = Assignment),
        (status = 404, description = "Student is not assigned", body = ErrorResponse),
    )
)]
pub async fn student_assignment(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, AdmissionError> {
    let assignment = state
        .admission_service
        .assignment_for_student(StudentId::new(id))
        .await?;
    Ok(Json(assignment))
}

/// Student routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/students/{id}/requests", get(list_student_requests))
        .route("/students/{id}/assignment", get(student_assignment))
}
