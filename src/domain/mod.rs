//! Domain layer: identifiers, polls, waitlist requests, storage and events.
//!
//! This module contains the server-side model: opaque identities from the
//! external registry, the poll aggregate with its requests, the per-poll
//! locked [`PollStore`], the per-student [`StudentLedger`], and the event
//! journal that carries committed changes in order.

pub mod admission_event;
pub mod event_bus;
pub mod identity;
pub mod ids;
pub mod poll;
pub mod poll_store;
pub mod student_ledger;
pub mod wait_list;

pub use admission_event::{AdmissionEvent, DeactivationReason};
pub use event_bus::{EventBus, EventStream};
pub use identity::{Identity, IdentityRegistry, InMemoryIdentityRegistry, Role, TrustingRegistry};
pub use ids::{CathedraId, PollId, RequestId, StudentId, TeacherId};
pub use poll::{DEFAULT_MAX_STUDENTS, Occupancy, Poll, PollEntry};
pub use poll_store::{PollFilter, PollStore, RequestLocation};
pub use student_ledger::{Assignment, StudentLedger, StudentRecord};
pub use wait_list::{Decision, RequestStatus, WaitListRequest};
