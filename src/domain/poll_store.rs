//! Concurrent poll storage with per-poll fine-grained locking.
//!
//! [`PollStore`] keeps every poll in a `HashMap` where each entry is
//! individually protected by a [`tokio::sync::RwLock`]. A poll's entry lock
//! is the mutual-exclusion scope for its capacity check-and-write: the
//! poll record and all of its requests live behind the same lock.
//!
//! The teacher and request indexes sit behind synchronous locks. They are
//! only touched inside commit sections, which never `.await` once the
//! first write has happened, so a dropped future can't leave a half-done
//! commit behind.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

use super::poll::{Poll, PollEntry};
use super::{CathedraId, PollId, RequestId, StudentId, TeacherId, WaitListRequest};
use crate::error::AdmissionError;

/// Where a request lives and who submitted it.
///
/// Both fields are immutable for the life of the request, so the location
/// can be read without holding the poll's entry lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLocation {
    /// Request identifier.
    pub request_id: RequestId,
    /// Poll the request was submitted against.
    pub poll_id: PollId,
    /// Submitting student.
    pub student_id: StudentId,
}

#[derive(Debug, Default)]
struct RequestIndex {
    locations: HashMap<RequestId, RequestLocation>,
    by_student: HashMap<StudentId, Vec<RequestId>>,
}

/// Filter for [`PollStore::list`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PollFilter {
    /// Only polls owned by this teacher.
    pub teacher_id: Option<TeacherId>,
    /// Only polls whose `is_active` matches.
    pub active: Option<bool>,
}

/// Central store for polls and the requests submitted against them.
///
/// # Concurrency
///
/// - Reads of the same poll run concurrently; writes to it are serialized.
/// - Writes to different polls are concurrent.
/// - The index locks are leaf locks: they are held for a few map
///   operations and nothing is acquired while holding them.
#[derive(Debug)]
pub struct PollStore {
    polls: RwLock<HashMap<PollId, Arc<RwLock<PollEntry>>>>,
    active_by_teacher: Mutex<HashMap<TeacherId, PollId>>,
    requests: Mutex<RequestIndex>,
}

impl PollStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            polls: RwLock::new(HashMap::new()),
            active_by_teacher: Mutex::new(HashMap::new()),
            requests: Mutex::new(RequestIndex::default()),
        }
    }

    fn teachers(&self) -> std::sync::MutexGuard<'_, HashMap<TeacherId, PollId>> {
        self.active_by_teacher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn request_index(&self) -> std::sync::MutexGuard<'_, RequestIndex> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Opens a new active poll for the teacher.
    ///
    /// The new entry is returned still write-locked, so the caller can
    /// publish its creation before anyone else observes the poll.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionError::Validation`] if `max_students` is not a
    /// positive `u32`, or [`AdmissionError::ActivePollExists`] if the
    /// teacher already owns an active poll.
    pub async fn create_poll(
        &self,
        teacher_id: TeacherId,
        cathedra_id: CathedraId,
        max_students: i64,
        now: DateTime<Utc>,
    ) -> Result<OwnedRwLockWriteGuard<PollEntry>, AdmissionError> {
        let max_students = validate_capacity(max_students)?;
        let poll = Poll::new(teacher_id, cathedra_id, max_students, now);
        self.insert(PollEntry::new(poll)).await
    }

    /// Inserts a poll entry, registering it as the teacher's active poll
    /// when it is active. Returns the entry write-locked.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionError::ActivePollExists`] if the entry is active
    /// and its teacher already owns an active poll, or
    /// [`AdmissionError::Internal`] on a duplicate poll ID.
    pub async fn insert(
        &self,
        entry: PollEntry,
    ) -> Result<OwnedRwLockWriteGuard<PollEntry>, AdmissionError> {
        let poll_id = entry.poll.id;
        let teacher_id = entry.poll.teacher_id;
        let is_active = entry.poll.is_active;
        // Unreachable until it is in the map, so this never waits.
        let guard = Arc::new(RwLock::new(entry)).write_owned().await;

        let mut map = self.polls.write().await;
        let mut active = self.teachers();
        if is_active && let Some(existing) = active.get(&teacher_id) {
            return Err(AdmissionError::ActivePollExists {
                teacher_id,
                poll_id: *existing,
            });
        }
        if map.contains_key(&poll_id) {
            return Err(AdmissionError::Internal(format!(
                "poll {poll_id} already exists"
            )));
        }
        map.insert(poll_id, Arc::clone(OwnedRwLockWriteGuard::rwlock(&guard)));
        if is_active {
            active.insert(teacher_id, poll_id);
        }
        Ok(guard)
    }

    /// Returns a shared reference to the poll entry behind its lock.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionError::PollNotFound`] if no poll with the given
    /// ID exists.
    pub async fn get(&self, poll_id: PollId) -> Result<Arc<RwLock<PollEntry>>, AdmissionError> {
        let map = self.polls.read().await;
        map.get(&poll_id)
            .cloned()
            .ok_or(AdmissionError::PollNotFound(poll_id))
    }

    /// Deactivates a poll and frees its teacher. Returns the poll and
    /// whether it changed.
    ///
    /// Deactivating an inactive poll is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionError::PollNotFound`] if the poll does not exist.
    pub async fn deactivate(
        &self,
        poll_id: PollId,
        now: DateTime<Utc>,
    ) -> Result<(Poll, bool), AdmissionError> {
        let entry_lock = self.get(poll_id).await?;
        let mut entry = entry_lock.write().await;
        let changed = entry.deactivate(now);
        if changed {
            self.release_teacher(entry.poll.teacher_id, poll_id);
        }
        Ok((entry.poll.clone(), changed))
    }

    /// Frees the teacher to open another poll once `poll_id` is inactive.
    ///
    /// Callers may hold the poll's entry lock, and should keep holding it
    /// until the deactivation is published.
    pub fn release_teacher(&self, teacher_id: TeacherId, poll_id: PollId) {
        let mut active = self.teachers();
        if active.get(&teacher_id) == Some(&poll_id) {
            active.remove(&teacher_id);
        }
    }

    /// Returns the teacher's active poll ID, if any.
    pub fn active_poll_id(&self, teacher_id: TeacherId) -> Option<PollId> {
        self.teachers().get(&teacher_id).copied()
    }

    /// Records where a new request lives.
    ///
    /// Callers may hold the poll's entry lock.
    pub fn index_request(&self, request: &WaitListRequest) {
        let mut index = self.request_index();
        index.locations.insert(
            request.id,
            RequestLocation {
                request_id: request.id,
                poll_id: request.poll_id,
                student_id: request.student_id,
            },
        );
        index
            .by_student
            .entry(request.student_id)
            .or_default()
            .push(request.id);
    }

    /// Finds the poll and student of a request.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionError::RequestNotFound`] for an unknown request.
    pub fn locate(&self, request_id: RequestId) -> Result<RequestLocation, AdmissionError> {
        self.request_index()
            .locations
            .get(&request_id)
            .copied()
            .ok_or(AdmissionError::RequestNotFound(request_id))
    }

    /// Locations of every request the student ever submitted.
    pub fn student_requests(&self, student_id: StudentId) -> Vec<RequestLocation> {
        let index = self.request_index();
        index
            .by_student
            .get(&student_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| index.locations.get(id).copied())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns all polls matching the filter, oldest first.
    pub async fn list(&self, filter: PollFilter) -> Vec<Poll> {
        let entries: Vec<Arc<RwLock<PollEntry>>> =
            self.polls.read().await.values().cloned().collect();
        let mut polls = Vec::with_capacity(entries.len());
        for entry_lock in entries {
            let entry = entry_lock.read().await;
            if let Some(teacher_id) = filter.teacher_id
                && entry.poll.teacher_id != teacher_id
            {
                continue;
            }
            if let Some(active) = filter.active
                && entry.poll.is_active != active
            {
                continue;
            }
            polls.push(entry.poll.clone());
        }
        polls.sort_by_key(|p| p.created_at);
        polls
    }

    /// Returns the number of polls in the store.
    pub async fn poll_count(&self) -> usize {
        self.polls.read().await.len()
    }
}

impl Default for PollStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Converts a requested capacity into a positive `u32`.
///
/// # Errors
///
/// Returns [`AdmissionError::Validation`] for zero, negative or oversized
/// values.
pub fn validate_capacity(max_students: i64) -> Result<u32, AdmissionError> {
    if max_students <= 0 {
        return Err(AdmissionError::Validation(format!(
            "max_students must be positive, got {max_students}"
        )));
    }
    u32::try_from(max_students).map_err(|_| {
        AdmissionError::Validation(format!("max_students {max_students} is too large"))
    })
}
