//! Waitlist request DTOs: submit, close, and list filters.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{Decision, PollId, RequestId, RequestStatus, StudentId, WaitListRequest};
use crate::service::CloseOutcome;

/// Request body for `POST /requests`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitRequestBody {
    /// Submitting student.
    pub student_id: StudentId,
    /// Target poll.
    pub poll_id: PollId,
}

/// Request body for `POST /requests/{id}/close`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CloseRequestBody {
    /// `"accepted"` or `"declined"`.
    pub decision: Decision,
}

/// Response body for `POST /requests/{id}/close`.
#[derive(Debug, Serialize, ToSchema)]
pub struct CloseRequestResponse {
    /// The closed request.
    pub request: WaitListRequest,
    /// Requests declined because this accept filled the poll.
    pub cascaded: Vec<RequestId>,
    /// Whether the poll was deactivated by this close.
    pub poll_deactivated: bool,
}

impl From<CloseOutcome> for CloseRequestResponse {
    fn from(outcome: CloseOutcome) -> Self {
        Self {
            request: outcome.request,
            cascaded: outcome.cascaded.iter().map(|c| c.request_id).collect(),
            poll_deactivated: outcome.poll_deactivated,
        }
    }
}

/// Status selector for `GET /polls/{id}/requests`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    /// Only pending requests (default).
    #[default]
    Pending,
    /// Only accepted requests.
    Accepted,
    /// Only declined requests.
    Declined,
    /// Every request.
    All,
}

impl StatusFilter {
    /// Converts to the status to match, `None` meaning all.
    #[must_use]
    pub const fn status(self) -> Option<RequestStatus> {
        match self {
            Self::Pending => Some(RequestStatus::Pending),
            Self::Accepted => Some(RequestStatus::Accepted),
            Self::Declined => Some(RequestStatus::Declined),
            Self::All => None,
        }
    }
}

/// Query parameters for `GET /polls/{id}/requests`.
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RequestListQuery {
    /// Which requests to list; `pending` when omitted.
    #[serde(default)]
    pub status: StatusFilter,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::service::CascadedRequest;
    use chrono::Utc;

    #[test]
    fn status_filter_defaults_to_pending() {
        let Ok(query) = serde_json::from_str::<RequestListQuery>("{}") else {
            panic!("deserialization failed");
        };
        assert_eq!(query.status.status(), Some(RequestStatus::Pending));
        assert_eq!(StatusFilter::All.status(), None);
    }

    #[test]
    fn close_response_lists_cascaded_ids() {
        let request = WaitListRequest::new(StudentId::new(1), PollId::new(), Utc::now());
        let cascaded = RequestId::new();
        let response = CloseRequestResponse::from(CloseOutcome {
            request,
            cascaded: vec![CascadedRequest {
                request_id: cascaded,
                status: RequestStatus::Declined,
            }],
            poll_deactivated: true,
        });
        assert_eq!(response.cascaded, vec![cascaded]);
        assert!(response.poll_deactivated);
    }
}
