//! Waitlist requests and their lifecycle.
//!
//! A request starts `Pending` and is closed exactly once, into either
//! `Accepted` or `Declined`. Both are terminal.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{PollId, RequestId, StudentId};
use crate::error::AdmissionError;

/// Lifecycle state of a [`WaitListRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Awaiting a teacher decision.
    Pending,
    /// Student admitted to the poll.
    Accepted,
    /// Student turned down.
    Declined,
}

impl RequestStatus {
    /// Returns the lowercase label used on the wire.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
        }
    }

    /// Returns `true` once the request can no longer change.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome a teacher may close a request with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Admit the student.
    Accepted,
    /// Turn the student down.
    Declined,
}

impl From<Decision> for RequestStatus {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Accepted => Self::Accepted,
            Decision::Declined => Self::Declined,
        }
    }
}

/// A student's request to be admitted to a poll.
///
/// `date_created` never changes; `date_closed` is `None` while pending and
/// is written once, by [`WaitListRequest::close`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WaitListRequest {
    /// Unique request identifier.
    pub id: RequestId,
    /// Requesting student.
    pub student_id: StudentId,
    /// Target poll.
    pub poll_id: PollId,
    /// Current lifecycle state.
    pub status: RequestStatus,
    /// Submission timestamp.
    pub date_created: DateTime<Utc>,
    /// Timestamp at which the request left `Pending`.
    pub date_closed: Option<DateTime<Utc>>,
    /// Set when the request was declined because its poll filled up,
    /// rather than by a teacher decision.
    #[serde(default)]
    pub declined_by_cascade: bool,
}

impl WaitListRequest {
    /// Creates a new pending request.
    #[must_use]
    pub fn new(student_id: StudentId, poll_id: PollId, now: DateTime<Utc>) -> Self {
        Self {
            id: RequestId::new(),
            student_id,
            poll_id,
            status: RequestStatus::Pending,
            date_created: now,
            date_closed: None,
            declined_by_cascade: false,
        }
    }

    /// Returns `true` while the request awaits a decision.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self.status, RequestStatus::Pending)
    }

    /// Returns `true` if the request blocks a new submission by the same
    /// student on the same poll.
    #[must_use]
    pub const fn holds_place(&self) -> bool {
        matches!(self.status, RequestStatus::Pending | RequestStatus::Accepted)
    }

    /// Fails unless the request is still pending.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionError::InvalidTransition`] for a closed request.
    pub fn ensure_pending(&self) -> Result<(), AdmissionError> {
        if self.status.is_terminal() {
            return Err(AdmissionError::InvalidTransition {
                request_id: self.id,
                status: self.status,
            });
        }
        Ok(())
    }

    /// Moves the request out of `Pending`.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionError::InvalidTransition`] if the request is
    /// already closed; the request is left untouched.
    pub fn close(&mut self, decision: Decision, now: DateTime<Utc>) -> Result<(), AdmissionError> {
        self.ensure_pending()?;
        self.status = decision.into();
        self.date_closed = Some(now);
        Ok(())
    }

    /// Declines a pending request because its poll reached capacity.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionError::InvalidTransition`] if the request is
    /// already closed.
    pub fn decline_for_capacity(&mut self, now: DateTime<Utc>) -> Result<(), AdmissionError> {
        self.close(Decision::Declined, now)?;
        self.declined_by_cascade = true;
        Ok(())
    }
}
