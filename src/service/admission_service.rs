//! Admission service: the poll/request state machine and its side effects.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{
    AdmissionEvent, Assignment, CathedraId, DeactivationReason, Decision, EventBus,
    IdentityRegistry, Poll, PollEntry, PollId, PollStore, RequestId, RequestStatus,
    StudentId, StudentLedger, StudentRecord, TeacherId, WaitListRequest,
};
use crate::error::{AdmissionError, IdentityKind};

/// A request declined as a side effect of its poll filling up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct CascadedRequest {
    /// The declined request.
    pub request_id: RequestId,
    /// Its new status (always `declined`).
    pub status: RequestStatus,
}

/// Result of closing a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CloseOutcome {
    /// The request after closing.
    pub request: WaitListRequest,
    /// Other requests declined because the poll filled.
    pub cascaded: Vec<CascadedRequest>,
    /// Whether this close deactivated the poll.
    pub poll_deactivated: bool,
}

/// Orchestration layer for all admission operations.
///
/// Owns references to the [`PollStore`] and [`StudentLedger`] for state,
/// the [`IdentityRegistry`] for existence checks, and the [`EventBus`] for
/// event emission. Every mutation follows the pattern: acquire locks →
/// check → write → emit events → release locks.
///
/// Events are published under the poll's entry lock, so the bus carries
/// them in commit order and the persisted log replays exactly. Publishing
/// never blocks, and nothing between the first write and the release of
/// the locks awaits, so a dropped request future either committed
/// everything or nothing. The teacher index is released only after a deactivation
/// is published, so a successor poll's creation is always logged after it.
///
/// Lock order is student record, then poll entry, then the store's
/// indexes.
#[derive(Debug, Clone)]
pub struct AdmissionService {
    store: Arc<PollStore>,
    ledger: Arc<StudentLedger>,
    identities: Arc<dyn IdentityRegistry>,
    event_bus: EventBus,
}

impl AdmissionService {
    /// Creates a new `AdmissionService`.
    #[must_use]
    pub fn new(
        store: Arc<PollStore>,
        ledger: Arc<StudentLedger>,
        identities: Arc<dyn IdentityRegistry>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            store,
            ledger,
            identities,
            event_bus,
        }
    }

    /// Returns a reference to the inner [`PollStore`].
    #[must_use]
    pub fn store(&self) -> &Arc<PollStore> {
        &self.store
    }

    /// Returns a reference to the inner [`StudentLedger`].
    #[must_use]
    pub fn ledger(&self) -> &Arc<StudentLedger> {
        &self.ledger
    }

    /// Opens a poll for a teacher.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionError::IdentityNotFound`] for an unknown teacher
    /// or cathedra, [`AdmissionError::Validation`] for a non-positive
    /// capacity, or [`AdmissionError::ActivePollExists`] if the teacher
    /// already has an active poll.
    pub async fn create_poll(
        &self,
        teacher_id: TeacherId,
        cathedra_id: CathedraId,
        max_students: i64,
    ) -> Result<Poll, AdmissionError> {
        if !self.identities.teacher_exists(teacher_id) {
            return Err(AdmissionError::IdentityNotFound(IdentityKind::Teacher(
                teacher_id,
            )));
        }
        if !self.identities.cathedra_exists(cathedra_id) {
            return Err(AdmissionError::IdentityNotFound(IdentityKind::Cathedra(
                cathedra_id,
            )));
        }

        let now = Utc::now();
        let entry = self
            .store
            .create_poll(teacher_id, cathedra_id, max_students, now)
            .await?;
        let poll = entry.poll.clone();

        let _ = self.event_bus.publish(AdmissionEvent::PollCreated {
            poll: poll.clone(),
            timestamp: now,
        });
        drop(entry);

        tracing::info!(poll_id = %poll.id, %teacher_id, max_students = poll.max_students, "poll created");
        Ok(poll)
    }

    /// Deactivates a poll. Deactivating an inactive poll is a no-op.
    ///
    /// Pending requests stay pending and can still be declined.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionError::PollNotFound`] if the poll does not exist.
    pub async fn deactivate_poll(&self, poll_id: PollId) -> Result<Poll, AdmissionError> {
        let entry_lock = self.store.get(poll_id).await?;
        let mut entry = entry_lock.write().await;

        let now = Utc::now();
        if !entry.deactivate(now) {
            tracing::debug!(%poll_id, "poll already inactive");
            return Ok(entry.poll.clone());
        }

        let _ = self.event_bus.publish(AdmissionEvent::PollDeactivated {
            poll_id,
            reason: DeactivationReason::TeacherClosed,
            timestamp: now,
        });
        self.store.release_teacher(entry.poll.teacher_id, poll_id);
        let poll = entry.poll.clone();
        drop(entry);

        tracing::info!(%poll_id, "poll deactivated by teacher");
        Ok(poll)
    }

    /// Submits a student's request against a poll.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionError::IdentityNotFound`] for an unknown student,
    /// [`AdmissionError::PollNotFound`], [`AdmissionError::PollClosed`],
    /// [`AdmissionError::DuplicateRequest`] or
    /// [`AdmissionError::AlreadyAssigned`]. Nothing is recorded on failure.
    pub async fn submit_request(
        &self,
        student_id: StudentId,
        poll_id: PollId,
    ) -> Result<WaitListRequest, AdmissionError> {
        if !self.identities.student_exists(student_id) {
            return Err(AdmissionError::IdentityNotFound(IdentityKind::Student(
                student_id,
            )));
        }

        let entry_lock = self.store.get(poll_id).await?;
        let student_slot = self.ledger.slot(student_id).await;
        let student = student_slot.lock().await;
        let mut entry = entry_lock.write().await;

        if !entry.poll.is_active {
            return Err(AdmissionError::PollClosed(poll_id));
        }
        if entry.has_open_request(student_id) {
            return Err(AdmissionError::DuplicateRequest {
                student_id,
                poll_id,
            });
        }
        if student.assignment.is_some() {
            return Err(AdmissionError::AlreadyAssigned(student_id));
        }

        // Commit: no await until the locks drop.
        let request = WaitListRequest::new(student_id, poll_id, Utc::now());
        entry.push(request.clone());
        self.store.index_request(&request);

        let _ = self.event_bus.publish(AdmissionEvent::RequestSubmitted {
            request: request.clone(),
            timestamp: request.date_created,
        });
        drop(entry);
        drop(student);

        tracing::info!(request_id = %request.id, %student_id, %poll_id, "request submitted");
        Ok(request)
    }

    /// Closes a pending request as accepted or declined.
    ///
    /// An accept that fills the poll deactivates it and declines every
    /// other pending request on it, all at the same instant. The whole
    /// close commits under the poll's entry lock or not at all.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionError::RequestNotFound`],
    /// [`AdmissionError::InvalidTransition`], or for accepts
    /// [`AdmissionError::PollClosed`], [`AdmissionError::AlreadyAssigned`]
    /// and [`AdmissionError::CapacityExceeded`]. A failed accept never
    /// turns into a decline.
    pub async fn close_request(
        &self,
        request_id: RequestId,
        decision: Decision,
    ) -> Result<CloseOutcome, AdmissionError> {
        let location = self.store.locate(request_id)?;
        let entry_lock = self.store.get(location.poll_id).await?;

        // Declines never touch the student's assignment.
        let student_slot = match decision {
            Decision::Accepted => Some(self.ledger.slot(location.student_id).await),
            Decision::Declined => None,
        };
        let mut student = match &student_slot {
            Some(slot) => Some(slot.lock().await),
            None => None,
        };
        let mut entry = entry_lock.write().await;

        // Commit: no await until the locks drop.
        let now = Utc::now();
        let outcome = apply_close(&mut entry, student.as_deref(), request_id, decision, now)?;
        let teacher_id = entry.poll.teacher_id;

        if decision == Decision::Accepted
            && let Some(record) = student.as_mut()
        {
            record.assignment = Some(Assignment {
                student_id: location.student_id,
                request_id,
                poll_id: location.poll_id,
                teacher_id,
                assigned_at: now,
            });
        }
        let _ = self.event_bus.publish(AdmissionEvent::RequestClosed {
            request: outcome.request.clone(),
            cascaded: outcome.cascaded.iter().map(|c| c.request_id).collect(),
            timestamp: now,
        });
        if outcome.poll_deactivated {
            let _ = self.event_bus.publish(AdmissionEvent::PollDeactivated {
                poll_id: location.poll_id,
                reason: DeactivationReason::CapacityFilled,
                timestamp: now,
            });
            self.store.release_teacher(teacher_id, location.poll_id);
        }

        drop(entry);
        drop(student);

        tracing::info!(
            %request_id,
            student_id = %location.student_id,
            poll_id = %location.poll_id,
            status = %outcome.request.status,
            cascaded = outcome.cascaded.len(),
            "request closed"
        );
        if outcome.poll_deactivated {
            tracing::info!(poll_id = %location.poll_id, "poll filled and deactivated");
        }
        Ok(outcome)
    }

    /// Re-applies a previously committed event, without re-checking
    /// business rules or publishing.
    ///
    /// Used to rebuild state from the persisted event log at startup.
    ///
    /// # Errors
    ///
    /// Returns an error if the event refers to unknown polls or requests,
    /// or does not fit the current state.
    pub async fn replay(&self, event: AdmissionEvent) -> Result<(), AdmissionError> {
        match event {
            AdmissionEvent::PollCreated { poll, .. } => {
                drop(self.store.insert(PollEntry::new(poll)).await?);
            }
            AdmissionEvent::PollDeactivated {
                poll_id, timestamp, ..
            } => {
                self.store.deactivate(poll_id, timestamp).await?;
            }
            AdmissionEvent::RequestSubmitted { request, .. } => {
                let entry_lock = self.store.get(request.poll_id).await?;
                let mut entry = entry_lock.write().await;
                self.store.index_request(&request);
                entry.push(request);
            }
            AdmissionEvent::RequestClosed {
                request, cascaded, ..
            } => self.replay_close(&request, &cascaded).await?,
        }
        Ok(())
    }

    async fn replay_close(
        &self,
        request: &WaitListRequest,
        cascaded: &[RequestId],
    ) -> Result<(), AdmissionError> {
        let closed_at = request.date_closed.ok_or_else(|| {
            AdmissionError::Internal(format!("closed request {} has no close date", request.id))
        })?;
        let decision = match request.status {
            RequestStatus::Accepted => Decision::Accepted,
            RequestStatus::Declined => Decision::Declined,
            RequestStatus::Pending => {
                return Err(AdmissionError::Internal(format!(
                    "close event for request {} is still pending",
                    request.id
                )));
            }
        };

        let entry_lock = self.store.get(request.poll_id).await?;
        let mut entry = entry_lock.write().await;
        entry
            .request_mut(request.id)
            .ok_or(AdmissionError::RequestNotFound(request.id))?
            .close(decision, closed_at)?;
        for id in cascaded {
            entry
                .request_mut(*id)
                .ok_or(AdmissionError::RequestNotFound(*id))?
                .decline_for_capacity(closed_at)?;
        }
        let teacher_id = entry.poll.teacher_id;
        drop(entry);

        if decision == Decision::Accepted {
            let slot = self.ledger.slot(request.student_id).await;
            slot.lock().await.assignment = Some(Assignment {
                student_id: request.student_id,
                request_id: request.id,
                poll_id: request.poll_id,
                teacher_id,
                assigned_at: closed_at,
            });
        }
        Ok(())
    }
}

/// Applies a close decision to a locked poll entry.
///
/// All checks run before the first write, so on error the entry is
/// unchanged. `student` is the locked record of the request's student and
/// is required for accepts.
///
/// # Errors
///
/// See [`AdmissionService::close_request`].
pub fn apply_close(
    entry: &mut PollEntry,
    student: Option<&StudentRecord>,
    request_id: RequestId,
    decision: Decision,
    now: DateTime<Utc>,
) -> Result<CloseOutcome, AdmissionError> {
    let poll_id = entry.poll.id;
    let capacity = entry.poll.max_students;
    let request = entry
        .request(request_id)
        .ok_or(AdmissionError::RequestNotFound(request_id))?;

    if decision == Decision::Accepted {
        // Lost a race for the last slot: the winner's cascade declined us.
        if request.declined_by_cascade {
            return Err(AdmissionError::CapacityExceeded { poll_id, capacity });
        }
        request.ensure_pending()?;
        if !entry.poll.is_active {
            return Err(AdmissionError::PollClosed(poll_id));
        }
        if student.and_then(|record| record.assignment).is_some() {
            return Err(AdmissionError::AlreadyAssigned(request.student_id));
        }
        if entry.is_full() {
            return Err(AdmissionError::CapacityExceeded { poll_id, capacity });
        }
    } else {
        request.ensure_pending()?;
    }

    let request = entry
        .request_mut(request_id)
        .ok_or(AdmissionError::RequestNotFound(request_id))?;
    request.close(decision, now)?;
    let closed = request.clone();

    let mut cascaded = Vec::new();
    let mut poll_deactivated = false;
    if decision == Decision::Accepted && entry.is_full() {
        poll_deactivated = entry.deactivate(now);
        for pending in entry.pending_mut() {
            pending.decline_for_capacity(now)?;
            cascaded.push(CascadedRequest {
                request_id: pending.id,
                status: pending.status,
            });
        }
    }

    Ok(CloseOutcome {
        request: closed,
        cascaded,
        poll_deactivated,
    })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::domain::{EventStream, InMemoryIdentityRegistry, TrustingRegistry};

    fn make_service() -> AdmissionService {
        AdmissionService::new(
            Arc::new(PollStore::new()),
            Arc::new(StudentLedger::new()),
            Arc::new(TrustingRegistry),
            EventBus::detached(),
        )
    }

    fn make_journaled_service() -> (AdmissionService, EventStream) {
        let (bus, stream) = EventBus::channel();
        let service = AdmissionService::new(
            Arc::new(PollStore::new()),
            Arc::new(StudentLedger::new()),
            Arc::new(TrustingRegistry),
            bus,
        );
        (service, stream)
    }

    fn drain(stream: &mut EventStream) -> Vec<&'static str> {
        let mut types = Vec::new();
        while let Ok(event) = stream.try_recv() {
            types.push(event.event_type_str());
        }
        types
    }

    async fn open_poll(service: &AdmissionService, teacher: i64, capacity: i64) -> Poll {
        let Ok(poll) = service
            .create_poll(TeacherId::new(teacher), CathedraId::new(1), capacity)
            .await
        else {
            panic!("poll creation failed");
        };
        poll
    }

    async fn submit(service: &AdmissionService, student: i64, poll_id: PollId) -> RequestId {
        let Ok(request) = service
            .submit_request(StudentId::new(student), poll_id)
            .await
        else {
            panic!("submission failed");
        };
        request.id
    }

    #[tokio::test]
    async fn create_poll_emits_event() {
        let (service, mut rx) = make_journaled_service();

        let poll = open_poll(&service, 1, 3).await;

        let Some(event) = rx.recv().await else {
            panic!("expected event");
        };
        assert_eq!(event.event_type_str(), "poll_created");
        assert_eq!(event.poll_id(), poll.id);
    }

    #[tokio::test]
    async fn unknown_identities_are_rejected() {
        let service = AdmissionService::new(
            Arc::new(PollStore::new()),
            Arc::new(StudentLedger::new()),
            Arc::new(InMemoryIdentityRegistry::new()),
            EventBus::detached(),
        );

        let result = service
            .create_poll(TeacherId::new(1), CathedraId::new(1), 3)
            .await;
        assert!(matches!(
            result,
            Err(AdmissionError::IdentityNotFound(IdentityKind::Teacher(_)))
        ));

        let result = service
            .submit_request(StudentId::new(2), PollId::new())
            .await;
        assert!(matches!(
            result,
            Err(AdmissionError::IdentityNotFound(IdentityKind::Student(_)))
        ));
    }

    #[tokio::test]
    async fn submit_requires_open_poll_and_no_duplicate() {
        let service = make_service();
        let poll = open_poll(&service, 1, 3).await;

        let missing = service
            .submit_request(StudentId::new(1), PollId::new())
            .await;
        assert!(matches!(missing, Err(AdmissionError::PollNotFound(_))));

        submit(&service, 1, poll.id).await;
        let duplicate = service.submit_request(StudentId::new(1), poll.id).await;
        assert!(matches!(
            duplicate,
            Err(AdmissionError::DuplicateRequest { .. })
        ));

        let _ = service.deactivate_poll(poll.id).await;
        let closed = service.submit_request(StudentId::new(2), poll.id).await;
        assert!(matches!(closed, Err(AdmissionError::PollClosed(_))));
    }

    #[tokio::test]
    async fn student_may_resubmit_after_decline() {
        let service = make_service();
        let poll = open_poll(&service, 1, 3).await;
        let first = submit(&service, 1, poll.id).await;

        let Ok(_) = service.close_request(first, Decision::Declined).await else {
            panic!("decline failed");
        };
        let second = service.submit_request(StudentId::new(1), poll.id).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn accept_assigns_student() {
        let service = make_service();
        let poll = open_poll(&service, 7, 3).await;
        let request_id = submit(&service, 1, poll.id).await;

        let Ok(outcome) = service.close_request(request_id, Decision::Accepted).await else {
            panic!("accept failed");
        };
        assert_eq!(outcome.request.status, RequestStatus::Accepted);
        assert!(outcome.request.date_closed.is_some());
        assert!(outcome.cascaded.is_empty());
        assert!(!outcome.poll_deactivated);

        let Some(assignment) = service.ledger().assignment(StudentId::new(1)).await else {
            panic!("expected assignment");
        };
        assert_eq!(assignment.teacher_id, TeacherId::new(7));
        assert_eq!(assignment.request_id, request_id);
    }

    #[tokio::test]
    async fn filling_poll_cascades_declines() {
        let (service, mut rx) = make_journaled_service();
        let poll = open_poll(&service, 1, 1).await;
        let a = submit(&service, 1, poll.id).await;
        let b = submit(&service, 2, poll.id).await;

        let Ok(outcome) = service.close_request(a, Decision::Accepted).await else {
            panic!("accept failed");
        };
        assert!(outcome.poll_deactivated);
        assert_eq!(
            outcome.cascaded,
            vec![CascadedRequest {
                request_id: b,
                status: RequestStatus::Declined
            }]
        );

        let types = drain(&mut rx);
        assert_eq!(
            types,
            [
                "poll_created",
                "request_submitted",
                "request_submitted",
                "request_closed",
                "poll_deactivated"
            ]
        );
        assert_eq!(service.store().active_poll_id(TeacherId::new(1)), None);
    }

    #[tokio::test]
    async fn accept_on_inactive_poll_fails_but_decline_is_allowed() {
        let service = make_service();
        let poll = open_poll(&service, 1, 3).await;
        let a = submit(&service, 1, poll.id).await;
        let b = submit(&service, 2, poll.id).await;
        let _ = service.deactivate_poll(poll.id).await;

        let accept = service.close_request(a, Decision::Accepted).await;
        assert!(matches!(accept, Err(AdmissionError::PollClosed(_))));

        let decline = service.close_request(b, Decision::Declined).await;
        assert!(decline.is_ok());

        // The failed accept left the request untouched.
        let Ok(entry_lock) = service.store().get(poll.id).await else {
            panic!("poll not found");
        };
        let entry = entry_lock.read().await;
        assert!(entry.request(a).is_some_and(WaitListRequest::is_pending));
    }

    #[tokio::test]
    async fn accepting_second_poll_for_assigned_student_fails() {
        let service = make_service();
        let p1 = open_poll(&service, 1, 3).await;
        let p2 = open_poll(&service, 2, 3).await;
        let r1 = submit(&service, 1, p1.id).await;
        let r2 = submit(&service, 1, p2.id).await;

        assert!(service.close_request(r1, Decision::Accepted).await.is_ok());
        let second = service.close_request(r2, Decision::Accepted).await;
        assert!(matches!(second, Err(AdmissionError::AlreadyAssigned(_))));
    }

    #[tokio::test]
    async fn apply_close_leaves_entry_untouched_on_error() {
        let mut entry = PollEntry::new(Poll::new(
            TeacherId::new(1),
            CathedraId::new(1),
            1,
            Utc::now(),
        ));
        let request = WaitListRequest::new(StudentId::new(1), entry.poll.id, Utc::now());
        let request_id = request.id;
        entry.push(request);
        let assigned = StudentRecord {
            assignment: Some(Assignment {
                student_id: StudentId::new(1),
                request_id: RequestId::new(),
                poll_id: PollId::new(),
                teacher_id: TeacherId::new(2),
                assigned_at: Utc::now(),
            }),
        };

        let result = apply_close(
            &mut entry,
            Some(&assigned),
            request_id,
            Decision::Accepted,
            Utc::now(),
        );
        assert!(matches!(result, Err(AdmissionError::AlreadyAssigned(_))));
        assert!(entry.poll.is_active);
        assert_eq!(entry.pending_count(), 1);
    }

    #[tokio::test]
    async fn replay_rebuilds_state() {
        let (source, mut rx) = make_journaled_service();
        let poll = open_poll(&source, 1, 1).await;
        let a = submit(&source, 1, poll.id).await;
        let b = submit(&source, 2, poll.id).await;
        let _ = source.close_request(a, Decision::Accepted).await;

        let target = make_service();
        while let Ok(event) = rx.try_recv() {
            let Ok(()) = target.replay(event).await else {
                panic!("replay failed");
            };
        }

        let Ok(entry_lock) = target.store().get(poll.id).await else {
            panic!("poll not replayed");
        };
        let entry = entry_lock.read().await;
        assert!(!entry.poll.is_active);
        assert_eq!(entry.accepted_count(), 1);
        assert!(entry.request(b).is_some_and(|r| r.declined_by_cascade));
        drop(entry);
        assert!(target.ledger().assignment(StudentId::new(1)).await.is_some());
        assert_eq!(target.store().active_poll_id(TeacherId::new(1)), None);
    }

    #[tokio::test]
    async fn submission_cancelled_while_waiting_records_nothing() {
        let (service, mut rx) = make_journaled_service();
        let poll = open_poll(&service, 1, 2).await;
        let _ = drain(&mut rx);

        let Ok(entry_lock) = service.store().get(poll.id).await else {
            panic!("poll not found");
        };
        let held = entry_lock.read().await;
        let attempt = tokio::time::timeout(
            Duration::from_millis(20),
            service.submit_request(StudentId::new(1), poll.id),
        )
        .await;
        assert!(attempt.is_err());
        drop(held);

        assert!(drain(&mut rx).is_empty());
        assert!(service.store().student_requests(StudentId::new(1)).is_empty());

        // No half-written request blocks a retry.
        let request_id = submit(&service, 1, poll.id).await;
        assert!(service.store().locate(request_id).is_ok());
        assert_eq!(drain(&mut rx), ["request_submitted"]);
    }

    #[tokio::test]
    async fn accept_cancelled_while_waiting_leaves_poll_usable() {
        let (service, mut rx) = make_journaled_service();
        let poll = open_poll(&service, 1, 1).await;
        let a = submit(&service, 1, poll.id).await;
        let b = submit(&service, 2, poll.id).await;
        let _ = drain(&mut rx);

        let Ok(entry_lock) = service.store().get(poll.id).await else {
            panic!("poll not found");
        };
        let held = entry_lock.read().await;
        let attempt = tokio::time::timeout(
            Duration::from_millis(20),
            service.close_request(a, Decision::Accepted),
        )
        .await;
        assert!(attempt.is_err());
        drop(held);

        assert!(drain(&mut rx).is_empty());
        assert!(service.ledger().assignment(StudentId::new(1)).await.is_none());
        assert_eq!(
            service.store().active_poll_id(TeacherId::new(1)),
            Some(poll.id)
        );

        let Ok(outcome) = service.close_request(a, Decision::Accepted).await else {
            panic!("accept after cancellation failed");
        };
        assert!(outcome.poll_deactivated);
        assert_eq!(outcome.cascaded.len(), 1);
        assert_eq!(outcome.cascaded.first().map(|c| c.request_id), Some(b));
        assert_eq!(drain(&mut rx), ["request_closed", "poll_deactivated"]);
        let _ = open_poll(&service, 1, 1).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn aborted_submissions_keep_indexes_and_journal_in_step() {
        let (service, mut rx) = make_journaled_service();
        let service = Arc::new(service);
        let poll_id = open_poll(&service, 1, 500).await.id;
        let _ = drain(&mut rx);

        let mut tasks = Vec::new();
        for student in 1..=200 {
            let service = Arc::clone(&service);
            tasks.push(tokio::spawn(async move {
                service
                    .submit_request(StudentId::new(student), poll_id)
                    .await
            }));
        }
        for task in tasks.iter().step_by(2) {
            task.abort();
        }
        for task in tasks {
            let _ = task.await;
        }

        let Ok(entry_lock) = service.store().get(poll_id).await else {
            panic!("poll not found");
        };
        let entry = entry_lock.read().await;
        let stored: Vec<WaitListRequest> = entry.requests().cloned().collect();
        drop(entry);

        let journaled = drain(&mut rx);
        assert_eq!(journaled.len(), stored.len());
        assert!(journaled.iter().all(|t| *t == "request_submitted"));
        for request in &stored {
            let Ok(location) = service.store().locate(request.id) else {
                panic!("stored request missing from the index");
            };
            assert_eq!(location.poll_id, poll_id);
            assert_eq!(service.store().student_requests(request.student_id).len(), 1);
        }
    }
}
