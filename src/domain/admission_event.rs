//! Domain events reflecting committed admission mutations.
//!
//! Every state change emits one [`AdmissionEvent`] through the
//! [`super::EventBus`] while the poll entry lock that guarded the write is
//! still held, so the stream is in commit order. That stream is also the
//! persistence format: replaying it into an empty store rebuilds the exact
//! state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Poll, PollId, RequestId, WaitListRequest};

/// Why a poll stopped taking students.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeactivationReason {
    /// The owning teacher closed the poll.
    TeacherClosed,
    /// The last slot was filled by an accept.
    CapacityFilled,
}

/// Domain event emitted after every state mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AdmissionEvent {
    /// A teacher opened a poll.
    PollCreated {
        /// The new poll.
        poll: Poll,
        /// Emission timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A poll became inactive.
    PollDeactivated {
        /// Poll identifier.
        poll_id: PollId,
        /// Why it was deactivated.
        reason: DeactivationReason,
        /// Deactivation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A student submitted a request.
    RequestSubmitted {
        /// The new pending request.
        request: WaitListRequest,
        /// Emission timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A request was accepted or declined.
    ///
    /// `cascaded` lists requests declined in the same step because the
    /// poll filled up; they share `request.date_closed`.
    RequestClosed {
        /// The request after closing.
        request: WaitListRequest,
        /// Pending requests declined by the cascade.
        cascaded: Vec<RequestId>,
        /// Emission timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl AdmissionEvent {
    /// Returns the poll ID associated with this event.
    #[must_use]
    pub fn poll_id(&self) -> PollId {
        match self {
            Self::PollCreated { poll, .. } => poll.id,
            Self::PollDeactivated { poll_id, .. } => *poll_id,
            Self::RequestSubmitted { request, .. } | Self::RequestClosed { request, .. } => {
                request.poll_id
            }
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::PollCreated { .. } => "poll_created",
            Self::PollDeactivated { .. } => "poll_deactivated",
            Self::RequestSubmitted { .. } => "request_submitted",
            Self::RequestClosed { .. } => "request_closed",
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{CathedraId, StudentId, TeacherId};

    #[test]
    fn poll_created_event_type() {
        let poll = Poll::new(TeacherId::new(1), CathedraId::new(2), 3, Utc::now());
        let poll_id = poll.id;
        let event = AdmissionEvent::PollCreated {
            poll,
            timestamp: Utc::now(),
        };
        assert_eq!(event.event_type_str(), "poll_created");
        assert_eq!(event.poll_id(), poll_id);
    }

    #[test]
    fn request_closed_serializes_with_tag() {
        let request = WaitListRequest::new(StudentId::new(8), PollId::new(), Utc::now());
        let event = AdmissionEvent::RequestClosed {
            request,
            cascaded: vec![RequestId::new()],
            timestamp: Utc::now(),
        };
        let Ok(json) = serde_json::to_string(&event) else {
            panic!("serialization failed");
        };
        assert!(json.contains("\"event_type\":\"request_closed\""));
        assert!(json.contains("cascaded"));
    }

    #[test]
    fn deactivation_reads_back_from_json() {
        let event = AdmissionEvent::PollDeactivated {
            poll_id: PollId::new(),
            reason: DeactivationReason::CapacityFilled,
            timestamp: Utc::now(),
        };
        let Ok(value) = serde_json::to_value(&event) else {
            panic!("serialization failed");
        };
        assert_eq!(value["reason"], "capacity_filled");
        let Ok(parsed) = serde_json::from_value::<AdmissionEvent>(value) else {
            panic!("deserialization failed");
        };
        assert_eq!(parsed, event);
    }
}
