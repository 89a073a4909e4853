//! Admission error types with HTTP status code mapping.
//!
//! [`AdmissionError`] is the single error type of the service. Each variant
//! carries a distinct numeric code so a client can tell a lost race apart
//! from a request that is permanently invalid.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{CathedraId, PollId, RequestId, RequestStatus, StudentId, TeacherId};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 4002,
///     "message": "poll 6f1c... is closed",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see [`AdmissionError`] for ranges).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Kind of externally owned identity that failed an existence check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityKind {
    /// A student token.
    Student(StudentId),
    /// A teacher token.
    Teacher(TeacherId),
    /// A cathedra token.
    Cathedra(CathedraId),
}

impl std::fmt::Display for IdentityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Student(id) => write!(f, "student {id}"),
            Self::Teacher(id) => write!(f, "teacher {id}"),
            Self::Cathedra(id) => write!(f, "cathedra {id}"),
        }
    }
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category       | HTTP Status                    |
/// |-----------|----------------|--------------------------------|
/// | 1000–1999 | Validation     | 422 / 400                      |
/// | 2000–2999 | Not Found      | 404 Not Found                  |
/// | 3000–3999 | Server         | 500 Internal Server Error      |
/// | 4000–4999 | Business rules | 409 Conflict                   |
#[derive(Debug, thiserror::Error)]
pub enum AdmissionError {
    /// Input is well-formed but semantically invalid (e.g. zero capacity).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Request could not be interpreted.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Poll with the given ID was not found.
    #[error("poll not found: {0}")]
    PollNotFound(PollId),

    /// Waitlist request with the given ID was not found.
    #[error("request not found: {0}")]
    RequestNotFound(RequestId),

    /// The identity registry does not know the referenced party.
    #[error("unknown {0}")]
    IdentityNotFound(IdentityKind),

    /// The student has not been accepted by any poll.
    #[error("student {0} has no assignment")]
    AssignmentNotFound(StudentId),

    /// The teacher has no active poll.
    #[error("teacher {0} has no active poll")]
    NoActivePoll(TeacherId),

    /// Teacher already owns an active poll.
    #[error("teacher {teacher_id} already has active poll {poll_id}")]
    ActivePollExists {
        /// Teacher attempting to open a second poll.
        teacher_id: TeacherId,
        /// The poll that is still active.
        poll_id: PollId,
    },

    /// Poll is inactive: no new requests and no further accepts.
    #[error("poll {0} is closed")]
    PollClosed(PollId),

    /// Student already holds a pending or accepted request on the poll.
    #[error("student {student_id} already has an open request on poll {poll_id}")]
    DuplicateRequest {
        /// Submitting student.
        student_id: StudentId,
        /// Target poll.
        poll_id: PollId,
    },

    /// Student is already accepted by some poll.
    #[error("student {0} is already assigned to an advisor")]
    AlreadyAssigned(StudentId),

    /// Request has already left the `Pending` state.
    #[error("request {request_id} is already {status}")]
    InvalidTransition {
        /// Request being closed.
        request_id: RequestId,
        /// Terminal status it already holds.
        status: RequestStatus,
    },

    /// Accepting would exceed the poll capacity.
    #[error("poll {poll_id} is full ({capacity} students)")]
    CapacityExceeded {
        /// Full poll.
        poll_id: PollId,
        /// Its `max_students`.
        capacity: u32,
    },

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AdmissionError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Validation(_) => 1001,
            Self::InvalidRequest(_) => 1002,
            Self::PollNotFound(_) => 2001,
            Self::RequestNotFound(_) => 2002,
            Self::IdentityNotFound(_) => 2003,
            Self::AssignmentNotFound(_) => 2004,
            Self::NoActivePoll(_) => 2005,
            Self::Internal(_) => 3000,
            Self::PersistenceError(_) => 3001,
            Self::ActivePollExists { .. } => 4001,
            Self::PollClosed(_) => 4002,
            Self::DuplicateRequest { .. } => 4003,
            Self::AlreadyAssigned(_) => 4004,
            Self::InvalidTransition { .. } => 4005,
            Self::CapacityExceeded { .. } => 4006,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::PollNotFound(_)
            | Self::RequestNotFound(_)
            | Self::IdentityNotFound(_)
            | Self::AssignmentNotFound(_)
            | Self::NoActivePoll(_) => StatusCode::NOT_FOUND,
            Self::ActivePollExists { .. }
            | Self::PollClosed(_)
            | Self::DuplicateRequest { .. }
            | Self::AlreadyAssigned(_)
            | Self::InvalidTransition { .. }
            | Self::CapacityExceeded { .. } => StatusCode::CONFLICT,
            Self::PersistenceError(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Extra hint rendered into the `details` field of the response.
    #[must_use]
    pub const fn details(&self) -> Option<&'static str> {
        match self {
            Self::CapacityExceeded { .. } => {
                Some("the poll filled before this accept was applied")
            }
            _ => None,
        }
    }
}

impl From<sqlx::Error> for AdmissionError {
    fn from(err: sqlx::Error) -> Self {
        Self::PersistenceError(err.to_string())
    }
}

impl IntoResponse for AdmissionError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: self.details().map(str::to_string),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
