//! Poll-related DTOs for create and list operations.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::common_dto::PaginationMeta;
use crate::domain::{CathedraId, Poll, PollFilter, TeacherId};

/// Request body for `POST /polls`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePollRequest {
    /// Teacher opening the poll.
    pub teacher_id: TeacherId,
    /// Cathedra the poll belongs to.
    pub cathedra_id: CathedraId,
    /// Capacity; the server default (3) when omitted.
    #[serde(default)]
    pub max_students: Option<i64>,
}

/// Filter query parameters for `GET /polls`.
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PollListQuery {
    /// Only polls owned by this teacher.
    #[serde(default)]
    pub teacher_id: Option<i64>,
    /// Only active (`true`) or inactive (`false`) polls.
    #[serde(default)]
    pub active: Option<bool>,
}

impl From<PollListQuery> for PollFilter {
    fn from(query: PollListQuery) -> Self {
        Self {
            teacher_id: query.teacher_id.map(TeacherId::new),
            active: query.active,
        }
    }
}

/// Paginated list response for `GET /polls`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PollListResponse {
    /// Polls on this page, oldest first.
    pub data: Vec<Poll>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}
