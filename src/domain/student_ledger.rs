//! Per-student assignment records.
//!
//! Each student gets an individually locked [`StudentRecord`]. Holding that
//! lock is the mutual-exclusion scope for "at most one accepted request per
//! student": both submission and acceptance check and write the record
//! while holding it.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use utoipa::ToSchema;

use super::{PollId, RequestId, StudentId, TeacherId};

/// The advisor a student was accepted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Assignment {
    /// Assigned student.
    pub student_id: StudentId,
    /// The accepted request.
    pub request_id: RequestId,
    /// Poll the student was accepted into.
    pub poll_id: PollId,
    /// Advisor owning the poll.
    pub teacher_id: TeacherId,
    /// When the request was accepted.
    pub assigned_at: DateTime<Utc>,
}

/// Mutable per-student state.
#[derive(Debug, Default)]
pub struct StudentRecord {
    /// Set once, when one of the student's requests is accepted.
    pub assignment: Option<Assignment>,
}

/// Lazily populated map of student records.
#[derive(Debug, Default)]
pub struct StudentLedger {
    students: RwLock<HashMap<StudentId, Arc<Mutex<StudentRecord>>>>,
}

impl StudentLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the student's record lock, creating an empty record first
    /// if needed.
    pub async fn slot(&self, student_id: StudentId) -> Arc<Mutex<StudentRecord>> {
        if let Some(slot) = self.students.read().await.get(&student_id) {
            return Arc::clone(slot);
        }
        let mut map = self.students.write().await;
        Arc::clone(map.entry(student_id).or_default())
    }

    /// Returns the student's assignment, if any.
    pub async fn assignment(&self, student_id: StudentId) -> Option<Assignment> {
        let slot = self.students.read().await.get(&student_id).cloned()?;
        let record = slot.lock().await;
        record.assignment
    }
}
