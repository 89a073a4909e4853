//! Poll handlers: open, list, inspect, deactivate.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    CreatePollRequest, PaginationParams, PollListQuery, PollListResponse, RequestListQuery,
};
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::app_state::AppState;
use crate::domain::{Occupancy, Poll, PollId, TeacherId, WaitListRequest};
use crate::error::{AdmissionError, ErrorResponse};

/// `POST /polls` — Open a poll for a teacher.
///
/// # Errors
///
/// Returns [`AdmissionError`] on bad capacity, unknown identities, or when
/// the teacher already has an active poll.
#[utoipa::path(
    post,
    path = "/api/v1/polls",
    tag = "Polls",
    summary = "Open a poll",
    description = "Creates an active poll owned by the teacher. A teacher may own only one active poll at a time.",
    request_body = CreatePollRequest,
    responses(
        (status = 201, description = "Poll created", body = Poll),
        (status = 400, description = "Malformed body or path", body = ErrorResponse),
        (status = 404, description = "Unknown teacher or cathedra", body = ErrorResponse),
        (status = 409, description = "Teacher already has an active poll", body = ErrorResponse),
        (status = 422, description = "Non-positive capacity", body = ErrorResponse),
    )
)]
pub async fn create_poll(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreatePollRequest>,
) -> Result<impl IntoResponse, AdmissionError> {
    let max_students = req
        .max_students
        .unwrap_or_else(|| i64::from(state.default_max_students));

    let poll = state
        .admission_service
        .create_poll(req.teacher_id, req.cathedra_id, max_students)
        .await?;

    Ok((StatusCode::CREATED, Json(poll)))
}

/// `GET /polls` — List polls with pagination and optional filters.
///
/// # Errors
///
/// Returns [`AdmissionError`] on internal failures.
#[utoipa::path(
    get,
    path = "/api/v1/polls",
    tag = "Polls",
    summary = "List polls",
    description = "Returns a paginated list of polls, oldest first, optionally filtered by teacher and activity.",
    params(PaginationParams, PollListQuery),
    responses(
        (status = 200, description = "Paginated poll list", body = PollListResponse),
    )
)]
pub async fn list_polls(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<PaginationParams>,
    ApiQuery(filter): ApiQuery<PollListQuery>,
) -> Result<impl IntoResponse, AdmissionError> {
    let polls = state.admission_service.list_polls(filter.into()).await;
    let (data, pagination) = params.paginate(polls);
    Ok(Json(PollListResponse { data, pagination }))
}

/// `GET /polls/{id}` — Get a poll.
///
/// # Errors
///
/// Returns [`AdmissionError::PollNotFound`] if the poll does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/polls/{id}",
    tag = "Polls",
    summary = "Get a poll",
    params(
        ("id" = uuid::Uuid, Path, description = "Poll UUID"),
    ),
    responses(
        (status = 200, description = "Poll record", body = Poll),
        (status = 400, description = "Malformed body or path", body = ErrorResponse),
        (status = 404, description = "Poll not found", body = ErrorResponse),
    )
)]
pub async fn get_poll(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<uuid::Uuid>,
) -> Result<impl IntoResponse, AdmissionError> {
    let poll = state
        .admission_service
        .get_poll(PollId::from_uuid(id))
        .await?;
    Ok(Json(poll))
}

/// `POST /polls/{id}/deactivate` — Close a poll to new requests.
///
/// # Errors
///
/// Returns [`AdmissionError::PollNotFound`] if the poll does not exist.
#[utoipa::path(
    post,
    path = "/api/v1/polls/{id}/deactivate",
    tag = "Polls",
    summary = "Deactivate a poll",
    description = "Marks the poll inactive. Idempotent. Pending requests can still be declined.",
    params(
        ("id" = uuid::Uuid, Path, description = "Poll UUID"),
    ),
    responses(
        (status = 200, description = "Poll is inactive", body = Poll),
        (status = 404, description = "Poll not found", body = ErrorResponse),
    )
)]
pub async fn deactivate_poll(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<uuid::Uuid>,
) -> Result<impl IntoResponse, AdmissionError> {
    let poll = state
        .admission_service
        .deactivate_poll(PollId::from_uuid(id))
        .await?;
    Ok(Json(poll))
}

/// `GET /polls/{id}/requests` — Requests of a poll, oldest first.
///
/// # Errors
///
/// Returns [`AdmissionError::PollNotFound`] if the poll does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/polls/{id}/requests",
    tag = "Polls",
    summary = "List requests of a poll",
    description = "Returns pending requests ordered by submission time. Use `status` to list accepted, declined or all requests.",
    params(
        ("id" = uuid::Uuid, Path, description = "Poll UUID"),
        RequestListQuery,
    ),
    responses(
        (status = 200, description = "Ordered requests", body = Vec<WaitListRequest>),
        (status = 404, description = "Poll not found", body = ErrorResponse),
    )
)]
pub async fn list_poll_requests(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<uuid::Uuid>,
    ApiQuery(query): ApiQuery<RequestListQuery>,
) -> Result<impl IntoResponse, AdmissionError> {
    let requests = state
        .admission_service
        .list_for_poll(PollId::from_uuid(id), query.status.status())
        .await?;
    Ok(Json(requests))
}

/// `GET /polls/{id}/occupancy` — How full a poll is.
///
/// # Errors
///
/// Returns [`AdmissionError::PollNotFound`] if the poll does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/polls/{id}/occupancy",
    tag = "Polls",
    summary = "Poll occupancy",
    params(
        ("id" = uuid::Uuid, Path, description = "Poll UUID"),
    ),
    responses(
        (status = 200, description = "Accepted, pending and capacity counts", body = Occupancy),
        (status = 404, description = "Poll not found", body = ErrorResponse),
    )
)]
pub async fn poll_occupancy(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<uuid::Uuid>,
) -> Result<impl IntoResponse, AdmissionError> {
    let occupancy = state
        .admission_service
        .poll_occupancy(PollId::from_uuid(id))
        .await?;
    Ok(Json(occupancy))
}

/// `GET /teachers/{id}/poll` — The teacher's active poll.
///
/// # Errors
///
/// Returns [`AdmissionError::NoActivePoll`] if the teacher has none.
#[utoipa::path(
    get,
    path = "/api/v1/teachers/{id}/poll",
    tag = "Polls",
    summary = "Active poll of a teacher",
    params(
        ("id" = i64, Path, description = "Teacher ID"),
    ),
    responses(
        (status = 200, description = "Active poll", body = Poll),
        (status = 404, description = "Teacher has no active poll", body = ErrorResponse),
    )
)]
pub async fn teacher_poll(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, AdmissionError> {
    let poll = state
        .admission_service
        .active_poll_for_teacher(TeacherId::new(id))
        .await?;
    Ok(Json(poll))
}

/// Poll routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/polls", post(create_poll).get(list_polls))
        .route("/polls/{id}", get(get_poll))
        .route("/polls/{id}/deactivate", post(deactivate_poll))
        .route("/polls/{id}/requests", get(list_poll_requests))
        .route("/polls/{id}/occupancy", get(poll_occupancy))
        .route("/teachers/{id}/poll", get(teacher_poll))
}
