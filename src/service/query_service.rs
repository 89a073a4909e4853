//! Read-side projections over polls and requests. Nothing here mutates.

use crate::domain::{
    Assignment, Occupancy, Poll, PollFilter, PollId, RequestId, RequestStatus, StudentId,
    TeacherId, WaitListRequest,
};
use crate::error::AdmissionError;

use super::AdmissionService;

impl AdmissionService {
    /// Returns a poll by ID.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionError::PollNotFound`] if the poll does not exist.
    pub async fn get_poll(&self, poll_id: PollId) -> Result<Poll, AdmissionError> {
        let entry_lock = self.store().get(poll_id).await?;
        let entry = entry_lock.read().await;
        Ok(entry.poll.clone())
    }

    /// Returns polls matching the filter, oldest first.
    pub async fn list_polls(&self, filter: PollFilter) -> Vec<Poll> {
        self.store().list(filter).await
    }

    /// Returns the teacher's active poll.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionError::NoActivePoll`] if the teacher has none.
    pub async fn active_poll_for_teacher(
        &self,
        teacher_id: TeacherId,
    ) -> Result<Poll, AdmissionError> {
        let poll_id = self
            .store()
            .active_poll_id(teacher_id)
            .ok_or(AdmissionError::NoActivePoll(teacher_id))?;
        self.get_poll(poll_id).await
    }

    /// Returns a request by ID.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionError::RequestNotFound`] for an unknown request.
    pub async fn get_request(
        &self,
        request_id: RequestId,
    ) -> Result<WaitListRequest, AdmissionError> {
        let location = self.store().locate(request_id)?;
        let entry_lock = self.store().get(location.poll_id).await?;
        let entry = entry_lock.read().await;
        entry
            .request(request_id)
            .cloned()
            .ok_or(AdmissionError::RequestNotFound(request_id))
    }

    /// Pending requests of a poll, first submitted first.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionError::PollNotFound`] if the poll does not exist.
    pub async fn list_pending_for_poll(
        &self,
        poll_id: PollId,
    ) -> Result<Vec<WaitListRequest>, AdmissionError> {
        self.list_for_poll(poll_id, Some(RequestStatus::Pending))
            .await
    }

    /// Requests of a poll with the given status (all when `None`), ordered
    /// by `date_created`.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionError::PollNotFound`] if the poll does not exist.
    pub async fn list_for_poll(
        &self,
        poll_id: PollId,
        status: Option<RequestStatus>,
    ) -> Result<Vec<WaitListRequest>, AdmissionError> {
        let entry_lock = self.store().get(poll_id).await?;
        let entry = entry_lock.read().await;
        let mut requests: Vec<WaitListRequest> = entry
            .requests()
            .filter(|r| status.is_none_or(|s| r.status == s))
            .cloned()
            .collect();
        requests.sort_by_key(|r| r.date_created);
        Ok(requests)
    }

    /// Every request the student submitted, across all polls, oldest first.
    pub async fn list_for_student(&self, student_id: StudentId) -> Vec<WaitListRequest> {
        let locations = self.store().student_requests(student_id);
        let mut requests = Vec::with_capacity(locations.len());
        for location in locations {
            let Ok(entry_lock) = self.store().get(location.poll_id).await else {
                continue;
            };
            let entry = entry_lock.read().await;
            if let Some(request) = entry.request(location.request_id) {
                requests.push(request.clone());
            }
        }
        requests.sort_by_key(|r| r.date_created);
        requests
    }

    /// Accepted, pending and capacity counts for a poll.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionError::PollNotFound`] if the poll does not exist.
    pub async fn poll_occupancy(&self, poll_id: PollId) -> Result<Occupancy, AdmissionError> {
        let entry_lock = self.store().get(poll_id).await?;
        let entry = entry_lock.read().await;
        Ok(entry.occupancy())
    }

    /// The advisor a student was accepted by.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionError::AssignmentNotFound`] if the student has
    /// not been accepted anywhere.
    pub async fn assignment_for_student(
        &self,
        student_id: StudentId,
    ) -> Result<Assignment, AdmissionError> {
        self.ledger()
            .assignment(student_id)
            .await
            .ok_or(AdmissionError::AssignmentNotFound(student_id))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;

    use crate::domain::{
        CathedraId, Decision, EventBus, PollStore, StudentLedger, TrustingRegistry,
    };

    use super::*;

    fn make_service() -> AdmissionService {
        AdmissionService::new(
            Arc::new(PollStore::new()),
            Arc::new(StudentLedger::new()),
            Arc::new(TrustingRegistry),
            EventBus::detached(),
        )
    }

    async fn setup() -> (AdmissionService, Poll, Vec<RequestId>) {
        let service = make_service();
        let Ok(poll) = service
            .create_poll(TeacherId::new(1), CathedraId::new(1), 2)
            .await
        else {
            panic!("poll creation failed");
        };
        let mut ids = Vec::new();
        for student in 1..=3 {
            let Ok(request) = service
                .submit_request(StudentId::new(student), poll.id)
                .await
            else {
                panic!("submission failed");
            };
            ids.push(request.id);
        }
        (service, poll, ids)
    }

    #[tokio::test]
    async fn pending_list_is_first_come_first_considered() {
        let (service, poll, ids) = setup().await;
        let Ok(pending) = service.list_pending_for_poll(poll.id).await else {
            panic!("poll not found");
        };
        let listed: Vec<RequestId> = pending.iter().map(|r| r.id).collect();
        assert_eq!(listed, ids);
        assert!(pending.windows(2).all(|w| match w {
            [a, b] => a.date_created <= b.date_created,
            _ => true,
        }));
    }

    #[tokio::test]
    async fn occupancy_tracks_decisions() {
        let (service, poll, ids) = setup().await;
        let Some(first) = ids.first() else {
            panic!("no requests");
        };
        let _ = service.close_request(*first, Decision::Accepted).await;

        let Ok(occupancy) = service.poll_occupancy(poll.id).await else {
            panic!("poll not found");
        };
        assert_eq!(
            occupancy,
            Occupancy {
                accepted: 1,
                pending: 2,
                capacity: 2
            }
        );

        let Ok(accepted) = service
            .list_for_poll(poll.id, Some(RequestStatus::Accepted))
            .await
        else {
            panic!("poll not found");
        };
        assert_eq!(accepted.len(), 1);
        let Ok(all) = service.list_for_poll(poll.id, None).await else {
            panic!("poll not found");
        };
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn student_view_spans_polls() {
        let (service, first_poll, _) = setup().await;
        let Ok(second_poll) = service
            .create_poll(TeacherId::new(2), CathedraId::new(1), 3)
            .await
        else {
            panic!("poll creation failed");
        };
        let _ = service
            .submit_request(StudentId::new(1), second_poll.id)
            .await;

        let requests = service.list_for_student(StudentId::new(1)).await;
        let polls: Vec<PollId> = requests.iter().map(|r| r.poll_id).collect();
        assert_eq!(polls, vec![first_poll.id, second_poll.id]);
        assert!(service.list_for_student(StudentId::new(99)).await.is_empty());
    }

    #[tokio::test]
    async fn teacher_and_assignment_lookups() {
        let (service, poll, ids) = setup().await;
        let Ok(active) = service.active_poll_for_teacher(TeacherId::new(1)).await else {
            panic!("expected active poll");
        };
        assert_eq!(active.id, poll.id);
        assert!(matches!(
            service.active_poll_for_teacher(TeacherId::new(5)).await,
            Err(AdmissionError::NoActivePoll(_))
        ));

        assert!(matches!(
            service.assignment_for_student(StudentId::new(2)).await,
            Err(AdmissionError::AssignmentNotFound(_))
        ));
        let Some(second) = ids.get(1) else {
            panic!("missing request");
        };
        let _ = service.close_request(*second, Decision::Accepted).await;
        let Ok(assignment) = service.assignment_for_student(StudentId::new(2)).await else {
            panic!("expected assignment");
        };
        assert_eq!(assignment.poll_id, poll.id);

        let Ok(request) = service.get_request(*second).await else {
            panic!("request not found");
        };
        assert_eq!(request.status, RequestStatus::Accepted);
        assert!(service.get_request(RequestId::new()).await.is_err());
    }
}
