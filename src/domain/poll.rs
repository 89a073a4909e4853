//! Polls and the per-poll aggregate guarded by the store's entry lock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::wait_list::{RequestStatus, WaitListRequest};
use super::{CathedraId, PollId, RequestId, StudentId, TeacherId};

/// Capacity used when a teacher does not choose one.
pub const DEFAULT_MAX_STUDENTS: u32 = 3;

/// A teacher-initiated, capacity-limited advisor slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Poll {
    /// Unique poll identifier (immutable after creation).
    pub id: PollId,
    /// Owning teacher.
    pub teacher_id: TeacherId,
    /// Organisational scope; informational only.
    pub cathedra_id: CathedraId,
    /// Maximum number of accepted students.
    pub max_students: u32,
    /// Whether the poll still takes submissions and accepts.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// When the poll was deactivated, if it was.
    pub deactivated_at: Option<DateTime<Utc>>,
}

impl Poll {
    /// Creates a new active poll.
    #[must_use]
    pub fn new(
        teacher_id: TeacherId,
        cathedra_id: CathedraId,
        max_students: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PollId::new(),
            teacher_id,
            cathedra_id,
            max_students,
            is_active: true,
            created_at: now,
            deactivated_at: None,
        }
    }
}

/// Snapshot of how full a poll is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Occupancy {
    /// Accepted requests.
    pub accepted: u32,
    /// Requests still awaiting a decision.
    pub pending: u32,
    /// The poll's `max_students`.
    pub capacity: u32,
}

/// A poll together with every request ever submitted against it.
///
/// Requests are kept in submission order and are never removed, so the
/// poll outlives nothing that references it.
#[derive(Debug)]
pub struct PollEntry {
    /// The poll record.
    pub poll: Poll,
    requests: Vec<WaitListRequest>,
}

impl PollEntry {
    /// Wraps a freshly created poll with no requests.
    #[must_use]
    pub const fn new(poll: Poll) -> Self {
        Self {
            poll,
            requests: Vec::new(),
        }
    }

    /// Number of accepted requests.
    #[must_use]
    pub fn accepted_count(&self) -> u32 {
        self.count(RequestStatus::Accepted)
    }

    /// Number of pending requests.
    #[must_use]
    pub fn pending_count(&self) -> u32 {
        self.count(RequestStatus::Pending)
    }

    fn count(&self, status: RequestStatus) -> u32 {
        let n = self.requests.iter().filter(|r| r.status == status).count();
        u32::try_from(n).unwrap_or(u32::MAX)
    }

    /// Returns `true` if accepted requests fill the capacity.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.accepted_count() >= self.poll.max_students
    }

    /// Current occupancy snapshot.
    #[must_use]
    pub fn occupancy(&self) -> Occupancy {
        Occupancy {
            accepted: self.accepted_count(),
            pending: self.pending_count(),
            capacity: self.poll.max_students,
        }
    }

    /// Returns the request with the given ID.
    #[must_use]
    pub fn request(&self, id: RequestId) -> Option<&WaitListRequest> {
        self.requests.iter().find(|r| r.id == id)
    }

    /// Returns the request with the given ID for mutation.
    pub fn request_mut(&mut self, id: RequestId) -> Option<&mut WaitListRequest> {
        self.requests.iter_mut().find(|r| r.id == id)
    }

    /// All requests in submission order.
    pub fn requests(&self) -> impl Iterator<Item = &WaitListRequest> {
        self.requests.iter()
    }

    /// Mutable view over the pending requests, in submission order.
    pub fn pending_mut(&mut self) -> impl Iterator<Item = &mut WaitListRequest> {
        self.requests.iter_mut().filter(|r| r.is_pending())
    }

    /// Returns `true` if the student holds a pending or accepted request here.
    #[must_use]
    pub fn has_open_request(&self, student_id: StudentId) -> bool {
        self.requests
            .iter()
            .any(|r| r.student_id == student_id && r.holds_place())
    }

    /// Appends a request. Callers check eligibility first.
    pub fn push(&mut self, request: WaitListRequest) {
        self.requests.push(request);
    }

    /// Marks the poll inactive. Returns `false` if it already was.
    pub fn deactivate(&mut self, now: DateTime<Utc>) -> bool {
        if !self.poll.is_active {
            return false;
        }
        self.poll.is_active = false;
        self.poll.deactivated_at = Some(now);
        true
    }
}
